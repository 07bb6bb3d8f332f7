//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 本地回环 e2e 测试（TCP 行协议 / UDP 二进制包）
//! - 目的地故障隔离

#[cfg(test)]
mod contract_tests {
    use contracts::{ExportResult, ExportStatus, Protocol, SubmitResponse, DELIVERED_MESSAGE};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_response_snapshot() {
        let mut response = SubmitResponse::default();
        response.push(ExportResult::good("carbon", Protocol::Graphite, 2));
        response.push(ExportResult::bad(
            "collectd",
            Protocol::Collectd,
            "Configuration error: destination 'collectd': host is empty",
        ));

        assert_eq!(response.results[0].message, DELIVERED_MESSAGE);
        assert_eq!(response.results[1].status, ExportStatus::Bad);
        assert!(!response.all_good());
        assert_eq!(response.failed().count(), 1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader, ExportSettings};
    use contracts::{DestinationOptions, ExportStatus, PerfSample, ResultItem, TransportFailure};
    use dispatcher::encoding::packet::{decode_packet, part, Part, Value};
    use dispatcher::Dispatcher;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, UdpSocket};

    fn load(toml: &str) -> ExportSettings {
        let blueprint = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        ExportSettings::new(blueprint)
    }

    fn check_results() -> Vec<ResultItem> {
        vec![
            ResultItem::new(
                "cpu check",
                vec![PerfSample::new("load", 4.5).with_unit("%")],
            ),
            ResultItem::new("disk", vec![PerfSample::new("used%", 81.0)]),
        ]
    }

    async fn refused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    /// End-to-end test: config -> Dispatcher -> line protocol collector
    ///
    /// 验证完整的数据流：
    /// 1. ConfigLoader 解析配置并展开 parent 继承
    /// 2. Dispatcher 绑定目的地并渲染路径
    /// 3. 行协议记录经 TCP 到达采集端
    #[tokio::test]
    async fn test_e2e_line_protocol() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let mut received = String::new();
            conn.read_to_string(&mut received).await.unwrap();
            received
        });

        let settings = load(&format!(
            r#"
[sender]
host = "web 01"

[[destinations]]
alias = "base"
protocol = "graphite"
[destinations.options]
host = "127.0.0.1:{port}"
"perf path" = "${{hostname}}/${{check_alias}}/${{perf_alias}}"

[[destinations]]
alias = "carbon"
protocol = "graphite"
parent = "base"
[destinations.options]
"time-offset" = 10
"#
        ));

        let dispatcher = Dispatcher::from_provider(&settings, DestinationOptions::new())
            .unwrap()
            .select(&["carbon"])
            .unwrap();

        let batch = contracts::ExportBatch::new(1_700_000_000, check_results());
        let response = dispatcher.submit_batch(batch.into()).await;
        assert!(response.all_good(), "{response:?}");
        assert_eq!(response.results[0].records, 2);

        let received = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            received,
            "web_01/cpu_check/load 4.5 1700000010\nweb_01/disk/used% 81 1700000010\n"
        );
    }

    /// End-to-end test: config -> Dispatcher -> binary packet collector
    #[tokio::test]
    async fn test_e2e_binary_protocol() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();

        let settings = load(&format!(
            r#"
[sender]
host = "agent"

[[destinations]]
alias = "collectd"
protocol = "collectd"
[destinations.options]
host = "127.0.0.1"
port = {port}
"#
        ));
        let dispatcher = Dispatcher::from_provider(&settings, DestinationOptions::new()).unwrap();

        let response = dispatcher.submit(check_results()).await;
        assert!(response.all_good(), "{response:?}");

        let mut buf = vec![0u8; 2048];
        let len = tokio::time::timeout(Duration::from_secs(5), receiver.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let parts = decode_packet(&buf[..len]).unwrap();

        assert_eq!(
            parts[0],
            Part::Text {
                kind: part::HOST,
                value: "agent".into()
            }
        );
        assert!(parts.contains(&Part::Text {
            kind: part::PLUGIN,
            value: "cpu_check".into()
        }));
        let values: Vec<_> = parts
            .iter()
            .filter_map(|p| match p {
                Part::Values(v) => Some(v.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            values,
            vec![vec![Value::Gauge(4.5)], vec![Value::Gauge(81.0)]]
        );
    }

    /// 一个目的地失败不影响其他目的地
    #[tokio::test]
    async fn test_failing_destination_is_isolated() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let good_port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let mut received = String::new();
            conn.read_to_string(&mut received).await.unwrap();
            received
        });
        let bad_port = refused_port().await;

        let settings = load(&format!(
            r#"
[sender]
host = "agent"

[[destinations]]
alias = "refused"
protocol = "graphite"
[destinations.options]
host = "127.0.0.1"
port = {bad_port}
retry = 2
timeout = 2

[[destinations]]
alias = "unconfigured"
protocol = "graphite"

[[destinations]]
alias = "healthy"
protocol = "graphite"
[destinations.options]
host = "127.0.0.1"
port = {good_port}
"#
        ));
        let dispatcher = Dispatcher::from_provider(&settings, DestinationOptions::new()).unwrap();

        let response = dispatcher.submit(check_results()).await;
        let aliases: Vec<_> = response
            .results
            .iter()
            .map(|r| r.destination.as_str())
            .collect();
        assert_eq!(aliases, ["refused", "unconfigured", "healthy"]);

        let refused = &response.results[0];
        assert_eq!(refused.status, ExportStatus::Bad);
        assert!(refused.message.starts_with("Socket error:"));
        assert!(refused.message.contains(TransportFailure::Exhausted.as_str()));

        let unconfigured = &response.results[1];
        assert_eq!(unconfigured.status, ExportStatus::Bad);
        assert!(unconfigured.message.starts_with("Configuration error:"));

        assert!(response.results[2].is_good());
        let received = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.lines().count(), 2);

        let snapshot = dispatcher.metrics();
        assert_eq!(snapshot.delivered, 1);
        assert_eq!(snapshot.failed, 2);
    }

    /// send_perf 关闭时不连接，仍报告 good
    #[tokio::test]
    async fn test_overrides_disable_perfdata() {
        let settings = load(&format!(
            r#"
[[destinations]]
alias = "carbon"
protocol = "graphite"
[destinations.options]
host = "127.0.0.1"
port = {}
"#,
            refused_port().await
        ));

        let overrides = DestinationOptions::new().with("send-perfdata", false);
        let dispatcher = Dispatcher::from_provider(&settings, overrides).unwrap();

        let response = dispatcher.submit(check_results()).await;
        assert!(response.all_good());
        assert_eq!(response.results[0].records, 0);
    }

    /// 相同输入两次编码结果一致
    #[tokio::test]
    async fn test_encoding_is_idempotent() {
        use dispatcher::{Encoder, LineEncoder, PacketEncoder};

        let settings = load(
            r#"
[sender]
host = "agent"

[[destinations]]
alias = "carbon"
protocol = "graphite"
[destinations.options]
host = "127.0.0.1"

[[destinations]]
alias = "collectd"
protocol = "collectd"
"#,
        );
        let dispatcher = Dispatcher::from_provider(&settings, DestinationOptions::new()).unwrap();
        let bound: Vec<_> = dispatcher
            .bind_all()
            .into_iter()
            .map(|(_, d)| d.unwrap())
            .collect();

        let batch = contracts::ExportBatch::new(42, check_results());
        let line = LineEncoder::new(&bound[0]);
        assert_eq!(line.encode(&batch), line.encode(&batch));
        let packet = PacketEncoder::new(&bound[1]);
        assert_eq!(packet.encode(&batch), packet.encode(&batch));
    }
}
