//! Report coordinator — owns the lifecycle of one tailoring session.
//!
//! A session is keyed by a digest of its inputs. The primary task must finish
//! (or a ready cached report must exist) before any optional region runs.
//! Optional regions are lazy, run in parallel when requested together, merge
//! additively into the persisted report, and fail independently without
//! taking the rest of the report down. Career path advice depends only on
//! the resume text and is memoized under its own key.

pub mod handlers;
pub mod letter;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::engine::{self, TailoringResult};
use crate::errors::{AppError, TaskError};
use crate::llm::ModelClient;
use crate::schema::{
    AtsScoreBreakdown, CareerPathOutput, Certification, CoverLetterOutput, InterviewPrepOutput,
    QaPair, SkillAnalysisOutput, StructuredResume,
};
use crate::tasks::{self, TaskId};

// ────────────────────────────────────────────────────────────────────────────
// Keys
// ────────────────────────────────────────────────────────────────────────────

fn hex_digest(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Session key digest over both inputs.
pub fn content_hash(resume_text: &str, job_description: &str) -> String {
    hex_digest(&format!("{resume_text}{job_description}"))
}

/// Career path digest over the resume alone; the advice has no job
/// description dependency, so two sessions sharing a resume share it.
pub fn resume_hash(resume_text: &str) -> String {
    hex_digest(resume_text)
}

pub fn report_key(hash: &str) -> String {
    format!("report_{hash}")
}

pub fn resume_key(hash: &str) -> String {
    format!("resume_{hash}")
}

pub fn jd_key(hash: &str) -> String {
    format!("jd_{hash}")
}

pub fn career_path_key(resume_hash: &str) -> String {
    format!("careerpath_{resume_hash}")
}

// ────────────────────────────────────────────────────────────────────────────
// Report model
// ────────────────────────────────────────────────────────────────────────────

/// The incrementally built report. Mandatory fields come from the primary
/// task; each optional group appears once its region completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullReport {
    #[serde(default)]
    pub initial_ats_score: u8,
    #[serde(default)]
    pub tailored_ats_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ats_score_breakdown: Option<AtsScoreBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tailored_resume: Option<StructuredResume>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrated_keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_certifications: Option<Vec<Certification>>,
    #[serde(default, rename = "interviewQA", skip_serializing_if = "Option::is_none")]
    pub interview_qa: Option<Vec<QaPair>>,
}

impl FullReport {
    pub fn apply_primary(&mut self, result: &TailoringResult) {
        self.initial_ats_score = result.initial_ats_score;
        self.tailored_ats_score = result.tailored_ats_score;
        self.ats_score_breakdown = Some(result.ats_score_breakdown.clone());
        self.tailored_resume = Some(result.resume.clone());
    }

    /// A report is usable for display once its resume passes the readiness
    /// predicate.
    pub fn is_resume_ready(&self) -> bool {
        self.tailored_resume
            .as_ref()
            .map(StructuredResume::is_ready)
            .unwrap_or(false)
    }
}

/// The optional report regions a client can request lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    CoverLetter,
    SkillAnalysis,
    InterviewPrep,
    CareerPath,
}

/// In-flight slots. The primary refresh shares the same at-most-one gate as
/// the optional regions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    Primary,
    Region(Region),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TailorResponse {
    pub key: String,
    pub from_cache: bool,
    pub report: FullReport,
}

/// Result of one region request round. Failures are reported, never raised;
/// the report carries whatever completed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionsOutcome {
    pub report: FullReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_path: Option<CareerPathOutput>,
    pub failed: Vec<Region>,
    pub in_flight: Vec<Region>,
}

// ────────────────────────────────────────────────────────────────────────────
// Coordinator
// ────────────────────────────────────────────────────────────────────────────

pub struct ReportCoordinator {
    llm: Arc<dyn ModelClient>,
    cache: Arc<dyn CacheStore>,
    in_flight: Mutex<HashSet<(String, Slot)>>,
    /// Per-key locks serializing the read-merge-write cycle, so two regions
    /// finishing together cannot both merge from the same stale snapshot.
    merge_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ReportCoordinator {
    pub fn new(llm: Arc<dyn ModelClient>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            llm,
            cache,
            in_flight: Mutex::new(HashSet::new()),
            merge_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Starts (or resumes) a session for the given inputs.
    ///
    /// A cached report whose resume is ready is surfaced immediately, with a
    /// background primary run refreshing it afterwards. Otherwise the primary
    /// task runs in the foreground and its failure is blocking.
    pub async fn tailor(
        self: &Arc<Self>,
        resume_text: &str,
        job_description: &str,
    ) -> Result<TailorResponse, AppError> {
        if resume_text.trim().is_empty() {
            return Err(TaskError::MissingInput("resumeText".to_string()).into());
        }
        if job_description.trim().is_empty() {
            return Err(TaskError::MissingInput("jobDescription".to_string()).into());
        }

        let hash = content_hash(resume_text, job_description);

        // Persist the inputs so region requests can be served by key alone.
        self.cache_set(&resume_key(&hash), resume_text).await?;
        self.cache_set(&jd_key(&hash), job_description).await?;

        if let Some(cached) = self.load_report(&hash).await? {
            if cached.is_resume_ready() {
                info!("serving cached report for {hash}, refreshing in background");
                let this = Arc::clone(self);
                let (resume_text, job_description) =
                    (resume_text.to_string(), job_description.to_string());
                let background_hash = hash.clone();
                tokio::spawn(async move {
                    this.refresh_primary(&background_hash, &resume_text, &job_description)
                        .await;
                });
                return Ok(TailorResponse {
                    key: hash,
                    from_cache: true,
                    report: cached,
                });
            }
        }

        let result = engine::run_tailoring(self.llm.as_ref(), resume_text, job_description).await?;
        let report = self
            .merge_into_report(&hash, |report| report.apply_primary(&result))
            .await?;

        Ok(TailorResponse {
            key: hash,
            from_cache: false,
            report,
        })
    }

    /// Background stale-refresh of the primary result. Failures only log;
    /// the user already has a usable cached report.
    async fn refresh_primary(&self, hash: &str, resume_text: &str, job_description: &str) {
        if !self.try_begin(hash, Slot::Primary).await {
            return;
        }

        match engine::run_tailoring(self.llm.as_ref(), resume_text, job_description).await {
            Ok(result) => {
                if let Err(e) = self
                    .merge_into_report(hash, |report| report.apply_primary(&result))
                    .await
                {
                    warn!("failed to persist refreshed report for {hash}: {e}");
                }
            }
            Err(e) => warn!("background refresh failed for {hash}: {e}"),
        }

        self.end(hash, Slot::Primary).await;
    }

    pub async fn get_report(&self, hash: &str) -> Result<Option<FullReport>, AppError> {
        self.load_report(hash).await
    }

    /// Runs the requested regions that are neither satisfied nor already in
    /// flight, in parallel, and returns the merged report afterwards.
    pub async fn request_regions(
        self: &Arc<Self>,
        hash: &str,
        regions: &[Region],
    ) -> Result<RegionsOutcome, AppError> {
        let report = self
            .load_report(hash)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no report for key {hash}")))?;
        if !report.is_resume_ready() {
            return Err(AppError::Validation(
                "the primary report is not ready yet".to_string(),
            ));
        }

        let resume_text = self
            .cache_get(&resume_key(hash))
            .await?
            .ok_or_else(|| TaskError::MissingInput("resumeText".to_string()))
            .map_err(AppError::from)?;
        let job_description = self
            .cache_get(&jd_key(hash))
            .await?
            .ok_or_else(|| TaskError::MissingInput("jobDescription".to_string()))
            .map_err(AppError::from)?;

        let career_hash = resume_hash(&resume_text);

        let mut seen = HashSet::new();
        let mut in_flight = Vec::new();
        let mut pending = Vec::new();
        for &region in regions {
            if !seen.insert(region) {
                continue;
            }
            if self
                .region_satisfied(&report, &career_hash, region)
                .await?
            {
                continue;
            }
            // Career path work and its memo are shared across sessions with
            // the same resume, so its in-flight gate keys on the resume
            // digest, not the session hash.
            let gate = match region {
                Region::CareerPath => career_hash.as_str(),
                _ => hash,
            };
            if !self.try_begin(gate, Slot::Region(region)).await {
                in_flight.push(region);
                continue;
            }
            pending.push((region, gate.to_string()));
        }

        let mut handles = Vec::with_capacity(pending.len());
        for (region, gate) in pending {
            let this = Arc::clone(self);
            let hash = hash.to_string();
            let resume_text = resume_text.clone();
            let job_description = job_description.clone();
            handles.push(tokio::spawn(async move {
                let outcome = this
                    .run_region(&hash, region, &resume_text, &job_description)
                    .await;
                this.end(&gate, Slot::Region(region)).await;
                (region, outcome)
            }));
        }

        let mut failed = Vec::new();
        for handle in handles {
            match handle.await {
                Ok((_, Ok(()))) => {}
                Ok((region, Err(e))) => {
                    warn!("region {region:?} failed for {hash}: {e}");
                    failed.push(region);
                }
                Err(e) => {
                    warn!("region task panicked for {hash}: {e}");
                }
            }
        }

        let report = self.load_report(hash).await?.unwrap_or_default();
        let career_path = self.load_career_path(&career_hash).await?;

        Ok(RegionsOutcome {
            report,
            career_path,
            failed,
            in_flight,
        })
    }

    /// Whether a region's content already exists and needs no new task.
    async fn region_satisfied(
        &self,
        report: &FullReport,
        career_hash: &str,
        region: Region,
    ) -> Result<bool, AppError> {
        Ok(match region {
            Region::CoverLetter => report.cover_letter.is_some(),
            Region::SkillAnalysis => report.integrated_keywords.is_some(),
            Region::InterviewPrep => report.interview_qa.is_some(),
            Region::CareerPath => self.load_career_path(career_hash).await?.is_some(),
        })
    }

    async fn run_region(
        &self,
        hash: &str,
        region: Region,
        resume_text: &str,
        job_description: &str,
    ) -> Result<(), TaskError> {
        match region {
            Region::CoverLetter => {
                let prompt = tasks::render_pair(
                    TaskId::CoverLetter.spec().template,
                    resume_text,
                    job_description,
                );
                let output: CoverLetterOutput =
                    engine::run_contract_task(self.llm.as_ref(), TaskId::CoverLetter, &prompt)
                        .await?;

                let signature = self
                    .load_report(hash)
                    .await
                    .ok()
                    .flatten()
                    .and_then(|r| r.tailored_resume)
                    .map(|r| r.basics.name)
                    .filter(|name| !name.trim().is_empty());
                let letter =
                    letter::normalize_cover_letter(&output.cover_letter, signature.as_deref());

                self.merge_region(hash, move |report| {
                    report.cover_letter = Some(letter);
                })
                .await
            }
            Region::SkillAnalysis => {
                let prompt = tasks::render_pair(
                    TaskId::SkillAnalysis.spec().template,
                    resume_text,
                    job_description,
                );
                let output: SkillAnalysisOutput =
                    engine::run_contract_task(self.llm.as_ref(), TaskId::SkillAnalysis, &prompt)
                        .await?;

                self.merge_region(hash, move |report| {
                    report.integrated_keywords = Some(output.integrated_keywords);
                    report.missing_keywords = Some(output.missing_keywords);
                    report.suggested_certifications = Some(output.suggested_certifications);
                })
                .await
            }
            Region::InterviewPrep => {
                let prompt = tasks::render_pair(
                    TaskId::InterviewPrep.spec().template,
                    resume_text,
                    job_description,
                );
                let output: InterviewPrepOutput =
                    engine::run_contract_task(self.llm.as_ref(), TaskId::InterviewPrep, &prompt)
                        .await?;

                self.merge_region(hash, move |report| {
                    report.interview_qa = Some(output.interview_qa);
                })
                .await
            }
            Region::CareerPath => self.run_career_path(resume_text).await,
        }
    }

    /// Career path advice, memoized per resume. Lives outside the report so
    /// sessions sharing a resume share the result.
    async fn run_career_path(&self, resume_text: &str) -> Result<(), TaskError> {
        let career_hash = resume_hash(resume_text);
        let key = career_path_key(&career_hash);

        if let Ok(Some(_)) = self.cache.get(&key).await {
            return Ok(());
        }

        let prompt = tasks::render_single(
            TaskId::CareerPath.spec().template,
            "{resume_text}",
            resume_text,
        );
        let output: CareerPathOutput =
            engine::run_contract_task(self.llm.as_ref(), TaskId::CareerPath, &prompt).await?;

        let serialized = serde_json::to_string(&output)?;
        if let Err(e) = self.cache.set(&key, &serialized).await {
            warn!("failed to memoize career path under {key}: {e}");
        }
        Ok(())
    }

    async fn load_career_path(
        &self,
        career_hash: &str,
    ) -> Result<Option<CareerPathOutput>, AppError> {
        let Some(raw) = self.cache_get(&career_path_key(career_hash)).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(output) => Ok(Some(output)),
            Err(e) => {
                warn!("discarding unreadable career path blob: {e}");
                Ok(None)
            }
        }
    }

    // ── persistence ─────────────────────────────────────────────────────────

    async fn load_report(&self, hash: &str) -> Result<Option<FullReport>, AppError> {
        let Some(raw) = self.cache_get(&report_key(hash)).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                warn!("discarding unreadable report blob for {hash}: {e}");
                Ok(None)
            }
        }
    }

    /// Read-merge-write, serialized per key. Concurrent writers for
    /// *different* regions queue on the key's merge lock and each re-read
    /// before writing, so a merge never erases another region's completed
    /// content.
    async fn merge_into_report(
        &self,
        hash: &str,
        apply: impl FnOnce(&mut FullReport),
    ) -> Result<FullReport, AppError> {
        let lock = {
            let mut locks = self.merge_locks.lock().await;
            Arc::clone(locks.entry(hash.to_string()).or_default())
        };
        let _guard = lock.lock().await;

        let mut report = self.load_report(hash).await?.unwrap_or_default();
        apply(&mut report);
        let serialized = serde_json::to_string(&report)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("report serialization: {e}")))?;
        self.cache_set(&report_key(hash), &serialized).await?;
        Ok(report)
    }

    async fn merge_region(
        &self,
        hash: &str,
        apply: impl FnOnce(&mut FullReport),
    ) -> Result<(), TaskError> {
        self.merge_into_report(hash, apply)
            .await
            .map_err(|e| TaskError::Persistence(e.to_string()))?;
        Ok(())
    }

    async fn cache_get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.cache
            .get(key)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn cache_set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.cache
            .set(key, value)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    // ── in-flight gate ──────────────────────────────────────────────────────

    async fn try_begin(&self, hash: &str, slot: Slot) -> bool {
        self.in_flight
            .lock()
            .await
            .insert((hash.to_string(), slot))
    }

    async fn end(&self, hash: &str, slot: Slot) {
        self.in_flight
            .lock()
            .await
            .remove(&(hash.to_string(), slot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, MemoryCacheStore};
    use crate::engine::tests::{ready_resume_json, tailoring_response, ScriptedClient};
    use crate::llm::{LlmError, ModelRequest};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Routes responses by prompt content, since parallel regions make call
    /// order nondeterministic.
    struct RoutedClient {
        routes: Vec<(&'static str, String)>,
        calls: AtomicUsize,
    }

    impl RoutedClient {
        fn new(routes: Vec<(&'static str, String)>) -> Self {
            Self {
                routes,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelClient for RoutedClient {
        async fn complete(&self, request: ModelRequest<'_>) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for (needle, response) in &self.routes {
                if request.prompt.contains(needle) {
                    return Ok(response.clone());
                }
            }
            Ok(String::new())
        }
    }

    fn coordinator(llm: Arc<dyn ModelClient>) -> Arc<ReportCoordinator> {
        Arc::new(ReportCoordinator::new(
            llm,
            Arc::new(MemoryCacheStore::default()),
        ))
    }

    #[test]
    fn test_hashes_are_deterministic_and_career_ignores_jd() {
        assert_eq!(content_hash("r", "j"), content_hash("r", "j"));
        assert_ne!(content_hash("r", "j1"), content_hash("r", "j2"));
        assert_eq!(resume_hash("r"), resume_hash("r"));
        assert_eq!(career_path_key("abc"), "careerpath_abc");
    }

    #[tokio::test]
    async fn test_tailor_rejects_missing_inputs() {
        let coordinator = coordinator(Arc::new(ScriptedClient::new(vec![])));
        let err = coordinator.tailor("  ", "jd").await.unwrap_err();
        assert!(matches!(err, AppError::Task(TaskError::MissingInput(_))));
        let err = coordinator.tailor("resume", "").await.unwrap_err();
        assert!(matches!(err, AppError::Task(TaskError::MissingInput(_))));
    }

    #[tokio::test]
    async fn test_tailor_happy_path_persists_report_and_inputs() {
        let client = Arc::new(ScriptedClient::new(vec![tailoring_response(
            &ready_resume_json(),
        )]));
        let coordinator = coordinator(client);

        let resume = "Experience: Acme Corp, Engineer, 2020-2023\n- Built X";
        let response = coordinator.tailor(resume, "requires Python").await.unwrap();

        assert!(!response.from_cache);
        assert_eq!(response.report.tailored_ats_score, 75);
        assert!(response.report.is_resume_ready());

        let stored = coordinator.get_report(&response.key).await.unwrap().unwrap();
        assert!(stored.is_resume_ready());
        assert_eq!(
            coordinator
                .cache_get(&resume_key(&response.key))
                .await
                .unwrap()
                .as_deref(),
            Some(resume)
        );
    }

    #[tokio::test]
    async fn test_tailor_serves_ready_cache_and_refreshes_behind_it() {
        let client = Arc::new(ScriptedClient::new(vec![
            tailoring_response(&ready_resume_json()),
            tailoring_response(&ready_resume_json()),
        ]));
        let coordinator = coordinator(Arc::clone(&client) as Arc<dyn ModelClient>);

        let first = coordinator.tailor("resume", "jd").await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        let second = coordinator.tailor("resume", "jd").await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.report.tailored_ats_score, 75);

        // The background refresh issues its own primary call.
        for _ in 0..50 {
            if client.calls.load(Ordering::SeqCst) >= 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_merge_is_additive_across_regions() {
        let coordinator = coordinator(Arc::new(ScriptedClient::new(vec![])));
        let hash = "deadbeef";

        coordinator
            .merge_into_report(hash, |r| r.cover_letter = Some("Dear...".to_string()))
            .await
            .unwrap();
        coordinator
            .merge_into_report(hash, |r| {
                r.interview_qa = Some(vec![QaPair {
                    question: "Q".to_string(),
                    answer: "A".to_string(),
                }])
            })
            .await
            .unwrap();

        let report = coordinator.load_report(hash).await.unwrap().unwrap();
        assert_eq!(report.cover_letter.as_deref(), Some("Dear..."));
        assert_eq!(report.interview_qa.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_regions_run_in_parallel_and_fail_independently() {
        let cover = json!({"coverLetter": ""}).to_string(); // fails validation
        let skills = json!({
            "integratedKeywords": ["python"],
            "missingKeywords": ["kubernetes"],
            "suggestedCertifications": [{"name": "CKA", "url": "https://example.com/cka"}]
        })
        .to_string();
        let client = Arc::new(RoutedClient::new(vec![
            ("cover letter", cover),
            ("missing from the resume", skills),
        ]));
        let coordinator = coordinator(Arc::clone(&client) as Arc<dyn ModelClient>);

        // Seed a ready primary report plus its inputs.
        let hash = content_hash("resume", "jd");
        coordinator.cache_set(&resume_key(&hash), "resume").await.unwrap();
        coordinator.cache_set(&jd_key(&hash), "jd").await.unwrap();
        let resume: StructuredResume = serde_json::from_str(&ready_resume_json()).unwrap();
        coordinator
            .merge_into_report(&hash, |r| {
                r.tailored_resume = Some(resume);
            })
            .await
            .unwrap();

        let outcome = coordinator
            .request_regions(&hash, &[Region::CoverLetter, Region::SkillAnalysis])
            .await
            .unwrap();

        assert_eq!(outcome.failed, vec![Region::CoverLetter]);
        assert!(outcome.in_flight.is_empty());
        assert!(outcome.report.cover_letter.is_none());
        assert_eq!(
            outcome.report.integrated_keywords.as_deref(),
            Some(&["python".to_string()][..])
        );
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_satisfied_region_is_not_rerun() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let coordinator = coordinator(Arc::clone(&client) as Arc<dyn ModelClient>);

        let hash = content_hash("resume", "jd");
        coordinator.cache_set(&resume_key(&hash), "resume").await.unwrap();
        coordinator.cache_set(&jd_key(&hash), "jd").await.unwrap();
        let resume: StructuredResume = serde_json::from_str(&ready_resume_json()).unwrap();
        coordinator
            .merge_into_report(&hash, |r| {
                r.tailored_resume = Some(resume);
                r.cover_letter = Some("already here".to_string());
            })
            .await
            .unwrap();

        let outcome = coordinator
            .request_regions(&hash, &[Region::CoverLetter])
            .await
            .unwrap();

        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.report.cover_letter.as_deref(), Some("already here"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_in_flight_region_is_not_double_issued() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let coordinator = coordinator(Arc::clone(&client) as Arc<dyn ModelClient>);

        let hash = content_hash("resume", "jd");
        coordinator.cache_set(&resume_key(&hash), "resume").await.unwrap();
        coordinator.cache_set(&jd_key(&hash), "jd").await.unwrap();
        let resume: StructuredResume = serde_json::from_str(&ready_resume_json()).unwrap();
        coordinator
            .merge_into_report(&hash, |r| r.tailored_resume = Some(resume))
            .await
            .unwrap();

        assert!(
            coordinator
                .try_begin(&hash, Slot::Region(Region::InterviewPrep))
                .await
        );

        let outcome = coordinator
            .request_regions(&hash, &[Region::InterviewPrep])
            .await
            .unwrap();

        assert_eq!(outcome.in_flight, vec![Region::InterviewPrep]);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_career_path_is_memoized_per_resume() {
        let career = json!({
            "careerSuggestions": [{"pathTitle": "Staff Engineer", "pathDescription": "fit"}],
            "possibleJobPositions": ["Senior Engineer"],
            "suggestedCertifications": []
        })
        .to_string();
        let client = Arc::new(RoutedClient::new(vec![("career advisor", career)]));
        let coordinator = coordinator(Arc::clone(&client) as Arc<dyn ModelClient>);

        let hash = content_hash("resume", "jd");
        coordinator.cache_set(&resume_key(&hash), "resume").await.unwrap();
        coordinator.cache_set(&jd_key(&hash), "jd").await.unwrap();
        let resume: StructuredResume = serde_json::from_str(&ready_resume_json()).unwrap();
        coordinator
            .merge_into_report(&hash, |r| r.tailored_resume = Some(resume))
            .await
            .unwrap();

        let first = coordinator
            .request_regions(&hash, &[Region::CareerPath])
            .await
            .unwrap();
        assert!(first.failed.is_empty());
        assert_eq!(
            first.career_path.unwrap().career_suggestions[0].path_title,
            "Staff Engineer"
        );
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        let second = coordinator
            .request_regions(&hash, &[Region::CareerPath])
            .await
            .unwrap();
        assert!(second.career_path.is_some());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_region_merges_preserve_both_regions() {
        // Slow report reads widen the read-merge-write window so both merges
        // overlap; the per-key merge lock must serialize them.
        #[derive(Default)]
        struct DelayedStore {
            inner: MemoryCacheStore,
        }

        #[async_trait]
        impl CacheStore for DelayedStore {
            async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
                if key.starts_with("report_") {
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                }
                self.inner.get(key).await
            }

            async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
                self.inner.set(key, value).await
            }
        }

        let coordinator = Arc::new(ReportCoordinator::new(
            Arc::new(ScriptedClient::new(vec![])),
            Arc::new(DelayedStore::default()),
        ));

        let first = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .merge_into_report("feed01", |r| r.cover_letter = Some("CL".to_string()))
                    .await
            })
        };
        let second = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .merge_into_report("feed01", |r| {
                        r.interview_qa = Some(vec![QaPair {
                            question: "Q".to_string(),
                            answer: "A".to_string(),
                        }])
                    })
                    .await
            })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let report = coordinator.load_report("feed01").await.unwrap().unwrap();
        assert_eq!(report.cover_letter.as_deref(), Some("CL"));
        assert!(report.interview_qa.is_some());
    }

    #[tokio::test]
    async fn test_persistence_failure_surfaces_as_persistence_error() {
        struct RefusingStore {
            inner: MemoryCacheStore,
        }

        #[async_trait]
        impl CacheStore for RefusingStore {
            async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
                self.inner.get(key).await
            }

            async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
                if key.starts_with("report_") {
                    return Err(CacheError::Redis(redis::RedisError::from((
                        redis::ErrorKind::IoError,
                        "write refused",
                    ))));
                }
                self.inner.set(key, value).await
            }
        }

        let coordinator = Arc::new(ReportCoordinator::new(
            Arc::new(ScriptedClient::new(vec![])),
            Arc::new(RefusingStore {
                inner: MemoryCacheStore::default(),
            }),
        ));

        let err = coordinator.merge_region("beef02", |_| {}).await.unwrap_err();
        assert!(matches!(err, TaskError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_career_path_gate_spans_sessions_sharing_a_resume() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let coordinator = coordinator(Arc::clone(&client) as Arc<dyn ModelClient>);

        let hash = content_hash("resume", "jd");
        coordinator.cache_set(&resume_key(&hash), "resume").await.unwrap();
        coordinator.cache_set(&jd_key(&hash), "jd").await.unwrap();
        let resume: StructuredResume = serde_json::from_str(&ready_resume_json()).unwrap();
        coordinator
            .merge_into_report(&hash, |r| r.tailored_resume = Some(resume))
            .await
            .unwrap();

        // A second session sharing this resume already has career path work
        // outstanding; this session must not double-issue it.
        let career = resume_hash("resume");
        assert!(
            coordinator
                .try_begin(&career, Slot::Region(Region::CareerPath))
                .await
        );

        let outcome = coordinator
            .request_regions(&hash, &[Region::CareerPath])
            .await
            .unwrap();
        assert_eq!(outcome.in_flight, vec![Region::CareerPath]);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_regions_require_a_ready_primary() {
        let coordinator = coordinator(Arc::new(ScriptedClient::new(vec![])));
        let err = coordinator
            .request_regions("missing", &[Region::CoverLetter])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
