mod support;

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use favlens_core::{parse_candidates, CandidateJob, ComparisonVerdict, JobResultKind, Stage};
use favlens_engine::{
    normalize_image, CompareError, Comparator, FailureKind, FetchError, FetchMetadata,
    FetchOutput, FetchSettings, Fetcher, JobError, JobResult, NormalizedImage, PoolSettings,
    ReqwestFetcher, WorkerPool,
};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves canned bytes per URL; unknown URLs answer 404.
#[derive(Default)]
struct FakeFetcher {
    bodies: HashMap<String, Vec<u8>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), bytes);
        self
    }
}

#[async_trait::async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.bodies.get(url) {
            Some(bytes) => Ok(FetchOutput {
                bytes: bytes.clone(),
                metadata: FetchMetadata {
                    original_url: url.to_string(),
                    final_url: url.to_string(),
                    content_type: None,
                    byte_len: bytes.len() as u64,
                },
            }),
            None => Err(FetchError {
                kind: FailureKind::HttpStatus(404),
                message: format!("bad status for {url}: 404"),
            }),
        }
    }
}

/// Matches when the candidate is pixel-for-pixel the reference PNG.
struct IdentityComparator;

#[async_trait::async_trait]
impl Comparator for IdentityComparator {
    async fn compare(
        &self,
        reference: &NormalizedImage,
        candidate: &NormalizedImage,
    ) -> Result<ComparisonVerdict, CompareError> {
        Ok(ComparisonVerdict {
            is_match: reference.as_base64() == candidate.as_base64(),
        })
    }
}

struct FailingComparator;

#[async_trait::async_trait]
impl Comparator for FailingComparator {
    async fn compare(
        &self,
        _reference: &NormalizedImage,
        _candidate: &NormalizedImage,
    ) -> Result<ComparisonVerdict, CompareError> {
        Err(CompareError::Request("connection reset".to_string()))
    }
}

/// Panics on 1x1 candidates and matches everything else.
struct PanickyComparator;

#[async_trait::async_trait]
impl Comparator for PanickyComparator {
    async fn compare(
        &self,
        _reference: &NormalizedImage,
        candidate: &NormalizedImage,
    ) -> Result<ComparisonVerdict, CompareError> {
        if candidate.dimensions() == (1, 1) {
            panic!("comparator blew up");
        }
        Ok(ComparisonVerdict { is_match: true })
    }
}

fn reference_bytes() -> Vec<u8> {
    support::png([200, 0, 0])
}

fn reference() -> NormalizedImage {
    normalize_image(&reference_bytes()).unwrap()
}

fn jobs(count: usize) -> Vec<CandidateJob> {
    let input: String = (0..count).map(|i| format!("https://c{i}.example\n")).collect();
    parse_candidates(&input)
}

fn fetcher_for(jobs: &[CandidateJob]) -> FakeFetcher {
    jobs.iter().fold(FakeFetcher::default(), |fetcher, job| {
        fetcher.with(&job.url, reference_bytes())
    })
}

async fn collect(mut rx: mpsc::Receiver<JobResult>) -> Vec<JobResult> {
    let mut results = Vec::new();
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    results
}

fn build_pool(fetcher: FakeFetcher, concurrency: usize) -> (WorkerPool, Arc<FakeFetcher>) {
    support::init_logging();
    let fetcher = Arc::new(fetcher);
    let pool = WorkerPool::new(
        fetcher.clone(),
        Arc::new(IdentityComparator),
        reference(),
        PoolSettings {
            concurrency,
            delay: Duration::ZERO,
        },
    );
    (pool, fetcher)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_job_yields_exactly_one_result_for_any_concurrency() {
    for concurrency in [1, 2, 3, 8, 40] {
        let jobs = jobs(25);
        let (pool, _) = build_pool(fetcher_for(&jobs), concurrency);

        let results = collect(pool.run(jobs.clone())).await;

        assert_eq!(results.len(), 25, "concurrency {concurrency}");
        let ids: BTreeSet<_> = results.iter().map(|r| r.job_id).collect();
        assert_eq!(ids, (1..=25).collect::<BTreeSet<_>>());
        assert!(results.iter().all(JobResult::is_match));
    }
}

#[tokio::test]
async fn empty_job_list_closes_the_stream() {
    let (pool, _) = build_pool(FakeFetcher::default(), 3);
    assert!(collect(pool.run(Vec::new())).await.is_empty());
}

#[tokio::test]
async fn zero_concurrency_still_runs_one_worker() {
    let jobs = jobs(4);
    let (pool, _) = build_pool(fetcher_for(&jobs), 0);
    assert_eq!(collect(pool.run(jobs)).await.len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_flight_fetches_never_exceed_concurrency() {
    let jobs = jobs(16);
    let mut fetcher = fetcher_for(&jobs);
    fetcher.latency = Duration::from_millis(20);
    let (pool, fetcher) = build_pool(fetcher, 3);

    let results = collect(pool.run(jobs)).await;

    assert_eq!(results.len(), 16);
    assert!(fetcher.max_in_flight.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn failures_are_isolated_per_job() {
    let jobs = parse_candidates(
        "https://ok.example\nhttps://missing.example\nhttps://corrupt.example\nhttps://other.example/logo.png\n",
    );
    let fetcher = FakeFetcher::default()
        .with("https://ok.example/favicon.ico", reference_bytes())
        .with("https://corrupt.example/favicon.ico", b"GIF89a-garbage".to_vec())
        .with("https://other.example/logo.png", support::png([0, 0, 200]));
    let (pool, _) = build_pool(fetcher, 2);

    let mut results = collect(pool.run(jobs)).await;
    results.sort_by_key(|r| r.job_id);

    let kinds: Vec<_> = results.iter().map(JobResult::kind).collect();
    assert_eq!(
        kinds,
        vec![
            JobResultKind::Matched,
            JobResultKind::Failed,
            JobResultKind::Failed,
            JobResultKind::NotMatched,
        ]
    );

    let missing = results[1].error().unwrap();
    assert!(matches!(missing, JobError::Fetch(err) if err.status() == Some(404)));
    assert_eq!(missing.stage(), Stage::Fetching);

    let corrupt = results[2].error().unwrap();
    assert!(matches!(corrupt, JobError::Decode(_)));
    assert_eq!(corrupt.stage(), Stage::Normalizing);
}

#[tokio::test]
async fn compare_failures_fail_only_their_job() {
    let jobs = jobs(3);
    let pool = WorkerPool::new(
        Arc::new(fetcher_for(&jobs)),
        Arc::new(FailingComparator),
        reference(),
        PoolSettings::default(),
    );

    let results = collect(pool.run(jobs)).await;

    assert_eq!(results.len(), 3);
    for result in &results {
        let err = result.error().expect("compare error");
        assert_eq!(err.stage(), Stage::Comparing);
    }
}

#[tokio::test]
async fn delay_applies_before_every_fetch() {
    let jobs = jobs(3);
    let pool = WorkerPool::new(
        Arc::new(fetcher_for(&jobs)),
        Arc::new(IdentityComparator),
        reference(),
        PoolSettings {
            concurrency: 1,
            delay: Duration::from_millis(40),
        },
    );

    let started = Instant::now();
    let results = collect(pool.run(jobs)).await;

    assert_eq!(results.len(), 3);
    assert!(started.elapsed() >= Duration::from_millis(120));
}

#[tokio::test]
async fn http_404_fails_one_candidate_while_the_rest_complete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/good/favicon.ico"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(reference_bytes(), "image/png"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone/favicon.ico"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let input = format!(
        "{uri}/gone\n{uri}/good\n{uri}/good/\n",
        uri = server.uri()
    );
    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let pool = WorkerPool::new(
        Arc::new(fetcher),
        Arc::new(IdentityComparator),
        reference(),
        PoolSettings {
            concurrency: 1,
            delay: Duration::ZERO,
        },
    );

    let mut results = collect(pool.run(parse_candidates(&input))).await;
    results.sort_by_key(|r| r.job_id);

    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].error().and_then(|err| match err {
            JobError::Fetch(fetch) => fetch.status(),
            _ => None,
        }),
        Some(404)
    );
    assert!(results[1].is_match());
    assert!(results[2].is_match());
}

#[tokio::test]
async fn a_panicking_job_still_yields_one_failed_result() {
    let jobs = jobs(4);
    let tiny = support::encode(&image::RgbaImage::new(1, 1), image::ImageFormat::Png);
    let fetcher = jobs
        .iter()
        .enumerate()
        .fold(FakeFetcher::default(), |fetcher, (i, job)| {
            let bytes = if i == 1 { tiny.clone() } else { reference_bytes() };
            fetcher.with(&job.url, bytes)
        });
    let pool = WorkerPool::new(
        Arc::new(fetcher),
        Arc::new(PanickyComparator),
        reference(),
        PoolSettings {
            concurrency: 2,
            delay: Duration::ZERO,
        },
    );

    let mut results = collect(pool.run(jobs)).await;
    results.sort_by_key(|r| r.job_id);

    assert_eq!(results.len(), 4);
    assert_eq!(
        results.iter().map(JobResult::kind).collect::<Vec<_>>(),
        vec![
            JobResultKind::Matched,
            JobResultKind::Failed,
            JobResultKind::Matched,
            JobResultKind::Matched,
        ]
    );
    assert_eq!(
        results[1].error(),
        Some(&JobError::Panicked("comparator blew up".to_string()))
    );
}
