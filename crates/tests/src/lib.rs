//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract snapshots (wire shape of records)
//! - Decoder -> Tokenizer -> Normalizer -> Enricher -> Dispatcher runs
//! - HTTP backend against a mock cluster

#[cfg(test)]
mod fixtures {
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    pub fn write_gzip(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
        path
    }

    pub fn write_tgz(dir: &TempDir, name: &str, entries: &[(&str, &str)]) -> PathBuf {
        let path = dir.path().join(name);
        let encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (entry_name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, entry_name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
        path
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{CompressionKind, DispatchJob, Record};

    #[test]
    fn test_tokenized_record_wire_shape() {
        let record = ingestion::tokenize(r#"date=2024-01-02 devname="fw 01" action=deny"#);
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"date":"2024-01-02","devname":"fw 01","action":"deny"}"#
        );
    }

    #[test]
    fn test_compression_table() {
        assert_eq!("plain".parse::<CompressionKind>().unwrap(), CompressionKind::Plain);
        assert_eq!("gzip".parse::<CompressionKind>().unwrap(), CompressionKind::Gzip);
        assert_eq!("tgz".parse::<CompressionKind>().unwrap(), CompressionKind::TarGzip);
        assert!("zip".parse::<CompressionKind>().is_err());
    }

    #[test]
    fn test_job_id_from_field() {
        let record: Record = [("msg_id", "0001"), ("action", "accept")].into_iter().collect();
        let job = DispatchJob::with_id_field(7, record, Some("msg_id"));
        assert_eq!(job.seq, 7);
        assert_eq!(job.id.as_deref(), Some("0001"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use contracts::{ContractError, DispatchJob, IndexAck, IndexBackend, IndexTarget, Record};
    use dispatcher::{CancellationToken, Dispatcher, DispatcherConfig};
    use ingestion::{Enricher, IngestionError, RecordError, RecordStream, TimestampNormalizer};
    use observability::{FileReport, RunMetricsAggregator};
    use tempfile::TempDir;

    use crate::fixtures::{write_gzip, write_tgz};

    /// Backend keeping every document it receives
    #[derive(Default)]
    struct RecordingBackend {
        attempts: AtomicU64,
        documents: Mutex<Vec<Record>>,
        delay: Option<Duration>,
    }

    impl IndexBackend for RecordingBackend {
        fn name(&self) -> &str {
            "recording"
        }

        async fn index(
            &self,
            _target: &IndexTarget,
            job: &DispatchJob,
        ) -> Result<IndexAck, ContractError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.documents.lock().unwrap().push(job.record.clone());
            Ok(IndexAck {
                id: job.id.clone(),
                result: "created".to_string(),
            })
        }
    }

    fn small_pool() -> DispatcherConfig {
        DispatcherConfig {
            concurrency: 4,
            queue_capacity: 8,
            progress_interval: 1000,
        }
    }

    /// gzip file with one line lacking key=value pairs, full pipeline
    #[tokio::test]
    async fn test_e2e_gzip_with_malformed_line() {
        let dir = TempDir::new().unwrap();
        let path = write_gzip(
            &dir,
            "fw.log.gz",
            "date=2024-01-02 time=03:04:05 msg_id=1 srcip=10.0.0.1\n\
             garbage without pairs\n\
             date=2024-01-02 time=03:04:06 tz=\"+0200\" msg_id=2 srcip=10.0.0.2\n",
        );

        let declared_total = ingestion::count_lines(&path, None).unwrap();
        assert_eq!(declared_total, 3);

        let stream = RecordStream::open(&path, None)
            .unwrap()
            .with_normalizer(TimestampNormalizer::from_zone_name("UTC").unwrap())
            .with_enricher(Enricher::new([("observer.name", "fw01")]).unwrap());
        let metrics = stream.metrics();

        let mut records = Vec::new();
        let mut errors = Vec::new();
        for item in stream {
            match item {
                Ok(record) => records.push(record),
                Err(e) => errors.push(e),
            }
        }

        assert_eq!(records.len(), 2);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            IngestionError::Record {
                line: 2,
                source: RecordError::MissingField { .. }
            }
        ));
        assert_eq!(metrics.snapshot().malformed_records, 1);

        let jobs: Vec<DispatchJob> = records
            .into_iter()
            .enumerate()
            .map(|(seq, record)| DispatchJob::with_id_field(seq as u64, record, Some("msg_id")))
            .collect();

        let dispatcher = Dispatcher::new(
            RecordingBackend::default(),
            IndexTarget::new("fw-logs"),
            small_pool(),
        );
        let summary = dispatcher
            .run(jobs, declared_total, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(dispatcher.backend().attempts.load(Ordering::SeqCst), 2);

        let documents = dispatcher.backend().documents.lock().unwrap().clone();
        let mut bodies: Vec<serde_json::Value> = documents
            .iter()
            .map(|d| serde_json::to_value(d).unwrap())
            .collect();
        bodies.sort_by_key(|b| b["msg_id"].as_str().unwrap_or_default().to_string());

        assert_eq!(bodies[0]["@timestamp"], "2024-01-02T03:04:05+00:00");
        assert_eq!(bodies[1]["@timestamp"], "2024-01-02T03:04:06+02:00");
        assert_eq!(bodies[1]["observer"]["name"], "fw01");
        assert_eq!(bodies[1]["tz"], "+0200");
    }

    /// tar-gzip archive shipped to a mock cluster over HTTP
    #[tokio::test]
    async fn test_e2e_tgz_to_http_backend() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", mockito::Matcher::Regex(r"^/fw-logs/_doc/\d+$".to_string()))
            .match_query(mockito::Matcher::UrlEncoded(
                "pipeline".into(),
                "fortigate".into(),
            ))
            .with_status(201)
            .with_body(r#"{"result":"created"}"#)
            .expect(4)
            .create_async()
            .await;

        let config = config_loader::ConfigLoader::load_from_str(
            &format!(
                r#"
timezone = "Europe/Prague"

[elasticsearch]
url = "{}"
index = "fw-logs"
pipeline = "fortigate"
"#,
                server.url()
            ),
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let dir = TempDir::new().unwrap();
        let path = write_tgz(
            &dir,
            "fw.tgz",
            &[
                (
                    "fw-a.log",
                    "date=2024-01-02 time=03:04:05 msg_id=1\ndate=2024-01-02 time=03:04:06 msg_id=2\n",
                ),
                (
                    "fw-b.log",
                    "date=2024-07-02 time=03:04:05 msg_id=3\ndate=2024-07-02 time=03:04:06 msg_id=4\n",
                ),
            ],
        );

        let stream = RecordStream::open(&path, None)
            .unwrap()
            .with_normalizer(TimestampNormalizer::from_zone_name(&config.timezone).unwrap());
        let jobs: Vec<DispatchJob> = stream
            .enumerate()
            .map(|(seq, item)| DispatchJob::with_id_field(seq as u64, item.unwrap(), Some("msg_id")))
            .collect();
        assert_eq!(jobs.len(), 4);

        let es = &config.elasticsearch;
        let backend = dispatcher::ElasticsearchBackend::from_config(es).unwrap();
        let target = IndexTarget::new(es.index.clone().unwrap()).with_pipeline(es.pipeline.clone());
        let summary = dispatcher::dispatch_all(backend, target, jobs, 4).await.unwrap();

        assert_eq!(summary.succeeded, 4);
        assert_eq!(summary.failed, 0);
        mock.assert_async().await;
    }

    /// Failed deliveries are counted, the run keeps going
    #[tokio::test]
    async fn test_e2e_backend_rejections_are_counted() {
        let mut server = mockito::Server::new_async().await;
        let _rejected = server
            .mock("PUT", "/fw-logs/_doc/2")
            .with_status(400)
            .with_body(r#"{"error":"mapper_parsing_exception"}"#)
            .create_async()
            .await;
        let _accepted = server
            .mock("PUT", mockito::Matcher::Regex(r"^/fw-logs/_doc/[13]$".to_string()))
            .with_status(200)
            .with_body(r#"{"result":"updated"}"#)
            .create_async()
            .await;

        let config = contracts::ElasticsearchConfig {
            url: server.url(),
            ..Default::default()
        };
        let backend = dispatcher::ElasticsearchBackend::from_config(&config).unwrap();

        let stream = RecordStream::from_lines(
            ["msg_id=1", "msg_id=2", "msg_id=3"].map(|line| Ok(line.to_string())),
        );
        let jobs: Vec<DispatchJob> = stream
            .enumerate()
            .map(|(seq, item)| DispatchJob::with_id_field(seq as u64, item.unwrap(), Some("msg_id")))
            .collect();

        let summary = dispatcher::dispatch_all(backend, IndexTarget::new("fw-logs"), jobs, 3)
            .await
            .unwrap();
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.completed, 3);
    }

    /// Interrupt mid-run: returns promptly with a partial summary
    #[tokio::test]
    async fn test_e2e_cancellation_returns_partial_summary() {
        let endless = std::iter::repeat_with(|| Ok("date=2024-01-02 time=03:04:05".to_string()));
        let stream = RecordStream::from_lines(endless)
            .with_normalizer(TimestampNormalizer::from_zone_name("UTC").unwrap());
        let jobs = stream
            .filter_map(Result::ok)
            .enumerate()
            .map(|(seq, record)| DispatchJob::new(seq as u64, record));

        let dispatcher = Dispatcher::new(
            RecordingBackend {
                delay: Some(Duration::from_millis(5)),
                ..Default::default()
            },
            IndexTarget::new("fw-logs"),
            small_pool(),
        );

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let summary = tokio::time::timeout(Duration::from_secs(5), dispatcher.run(jobs, 0, cancel))
            .await
            .expect("dispatcher did not stop after cancellation")
            .unwrap();

        assert!(summary.cancelled);
        let attempts = dispatcher.backend().attempts.load(Ordering::SeqCst);
        assert!(summary.completed <= attempts);
        assert_eq!(summary.completed, summary.succeeded + summary.failed);
    }

    /// A corrupt file ends its stream with a fatal error
    #[tokio::test]
    async fn test_e2e_corrupt_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.log.gz");
        std::fs::write(&path, b"definitely not gzip").unwrap();

        let items: Vec<_> = RecordStream::open(&path, None).unwrap().collect();
        assert_eq!(items.len(), 1);
        let err = items.into_iter().next().unwrap().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, IngestionError::Decode { .. }));
    }

    /// Run summary folds per-file reports
    #[test]
    fn test_run_summary_aggregates_files() {
        let mut aggregator = RunMetricsAggregator::new();
        aggregator.update(&FileReport {
            lines_read: 3,
            malformed: 1,
            succeeded: 2,
            elapsed: Duration::from_millis(20),
            ..FileReport::new("fw.log.gz")
        });
        aggregator.update(&FileReport {
            error: Some("unsupported format".to_string()),
            ..FileReport::new("fw.zip")
        });

        let summary = aggregator.summary();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.succeeded, 2);
        assert!(summary.to_string().contains("Files: 2 (1 failed)"));
    }
}
