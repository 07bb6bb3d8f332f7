//! Parent inheritance
//!
//! A destination with a `parent` starts from the parent's fully resolved
//! options and overlays its own. Protocol is never inherited.

use contracts::{merge, ContractError, DestinationOptions, DestinationSettings, ExportBlueprint};

/// Flatten every destination's parent chain, keeping configuration order
pub fn flatten(blueprint: &ExportBlueprint) -> Result<Vec<DestinationSettings>, ContractError> {
    blueprint
        .destinations
        .iter()
        .map(|settings| {
            let options = resolved_options(blueprint, settings)?;
            Ok(DestinationSettings {
                alias: settings.alias.clone(),
                protocol: settings.protocol,
                parent: None,
                options,
            })
        })
        .collect()
}

fn resolved_options(
    blueprint: &ExportBlueprint,
    settings: &DestinationSettings,
) -> Result<DestinationOptions, ContractError> {
    // child first, root last
    let mut chain = vec![settings];
    let mut current = settings;
    while let Some(parent) = &current.parent {
        let next = blueprint.destination(parent).ok_or_else(|| {
            ContractError::config_validation(
                format!("destinations[{}].parent", current.alias),
                format!("parent '{parent}' not found in destinations"),
            )
        })?;
        if chain.iter().any(|s| s.alias == next.alias) {
            return Err(ContractError::config_validation(
                format!("destinations[{}].parent", settings.alias),
                "parent chain forms a cycle",
            ));
        }
        chain.push(next);
        current = next;
    }

    Ok(chain
        .iter()
        .rev()
        .fold(DestinationOptions::new(), |acc, s| merge(&acc, &s.options)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{keys, OptionValue, Protocol};

    #[test]
    fn test_child_overrides_parent() {
        let blueprint = ExportBlueprint {
            destinations: vec![
                DestinationSettings::new("base", Protocol::Graphite)
                    .with_option(keys::HOST, "carbon.example.net")
                    .with_option(keys::TIMEOUT, 5_i64),
                DestinationSettings {
                    parent: Some("base".into()),
                    ..DestinationSettings::new("mirror", Protocol::Graphite)
                        .with_option(keys::HOST, "mirror.example.net")
                },
                DestinationSettings {
                    parent: Some("mirror".into()),
                    ..DestinationSettings::new("deep", Protocol::Collectd)
                        .with_option(keys::RETRY, 1_i64)
                },
            ],
            ..Default::default()
        };

        let flat = flatten(&blueprint).unwrap();
        let aliases: Vec<_> = flat.iter().map(|s| s.alias.as_str()).collect();
        assert_eq!(aliases, ["base", "mirror", "deep"]);

        let mirror = &flat[1];
        assert_eq!(mirror.parent, None);
        assert_eq!(
            mirror.options.get_text(keys::HOST).as_deref(),
            Some("mirror.example.net")
        );
        assert_eq!(mirror.options.get(keys::TIMEOUT), Some(&OptionValue::Int(5)));

        let deep = &flat[2];
        assert_eq!(deep.protocol, Protocol::Collectd);
        assert_eq!(deep.options.get(keys::RETRY), Some(&OptionValue::Int(1)));
        assert_eq!(deep.options.get(keys::TIMEOUT), Some(&OptionValue::Int(5)));
        assert_eq!(
            deep.options.get_text(keys::HOST).as_deref(),
            Some("mirror.example.net")
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        let blueprint = ExportBlueprint {
            destinations: vec![
                DestinationSettings {
                    parent: Some("b".into()),
                    ..DestinationSettings::new("a", Protocol::Log)
                },
                DestinationSettings {
                    parent: Some("a".into()),
                    ..DestinationSettings::new("b", Protocol::Log)
                },
            ],
            ..Default::default()
        };

        assert!(flatten(&blueprint).is_err());
    }
}
