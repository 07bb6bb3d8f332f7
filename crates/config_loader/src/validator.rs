//! 配置校验模块
//!
//! 校验规则：
//! - 字段级约束 (validator derive，例如 alias 非空)
//! - alias 唯一
//! - parent 必须存在且不能指向自身
//! - parent 链不能成环
//! - sender.host 若给出则非空

use std::collections::{HashMap, HashSet};

use contracts::{ContractError, ExportBlueprint};
use validator::Validate;

/// 校验 ExportBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ExportBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_aliases(blueprint)?;
    validate_parents(blueprint)?;
    validate_parent_chains(blueprint)?;
    validate_sender(blueprint)?;
    Ok(())
}

/// 字段级约束
fn validate_fields(blueprint: &ExportBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("destinations", e.to_string()))
}

/// 校验 alias 唯一性
fn validate_aliases(blueprint: &ExportBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for destination in &blueprint.destinations {
        if !seen.insert(destination.alias.as_str()) {
            return Err(ContractError::config_validation(
                format!("destinations[alias={}]", destination.alias),
                "duplicate destination alias",
            ));
        }
    }
    Ok(())
}

/// 校验 parent 引用
fn validate_parents(blueprint: &ExportBlueprint) -> Result<(), ContractError> {
    for destination in &blueprint.destinations {
        let Some(parent) = &destination.parent else {
            continue;
        };

        if parent == &destination.alias {
            return Err(ContractError::config_validation(
                format!("destinations[{}].parent", destination.alias),
                "destination cannot inherit from itself",
            ));
        }

        if blueprint.destination(parent).is_none() {
            return Err(ContractError::config_validation(
                format!("destinations[{}].parent", destination.alias),
                format!("parent '{parent}' not found in destinations"),
            ));
        }
    }
    Ok(())
}

/// 校验 parent 链无环
fn validate_parent_chains(blueprint: &ExportBlueprint) -> Result<(), ContractError> {
    let parents: HashMap<&str, &str> = blueprint
        .destinations
        .iter()
        .filter_map(|d| d.parent.as_deref().map(|p| (d.alias.as_str(), p)))
        .collect();

    for start in parents.keys() {
        let mut visited = HashSet::from([*start]);
        let mut current = *start;
        while let Some(&parent) = parents.get(current) {
            if !visited.insert(parent) {
                return Err(ContractError::config_validation(
                    format!("destinations[{start}].parent"),
                    "parent chain forms a cycle",
                ));
            }
            current = parent;
        }
    }
    Ok(())
}

/// 校验发送方设置
fn validate_sender(blueprint: &ExportBlueprint) -> Result<(), ContractError> {
    if let Some(host) = &blueprint.sender.host {
        if host.trim().is_empty() {
            return Err(ContractError::config_validation(
                "sender.host",
                "sender host cannot be empty when set",
            ));
        }
    }
    Ok(())
}
