//! The governance pipeline.
//!
//! Coordinates the input gate, the pure validators, the similarity scorer,
//! the decision engine and the audit recorder for one request at a time.
//! Requests share only immutable state, so one governor serves any number
//! of concurrent callers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use crate::adapters::{
    check_proposal, EmbeddingProvider, HashingEmbeddings, OpenAiEmbeddings, OpenAiProposer,
    PlaceholderProposer, Proposal, ProposalProvider,
};
use crate::config::{EmbeddingBackend, ProposalBackend, ResolvedConfig};
use crate::domain::{Intent, Thresholds, ValidationRequest, ValidationResult};
use crate::error::{GovernanceError, GovernanceResult};
use crate::validators::{DocumentComparison, Lexicon, PairSignals, PolarityMatch, Validators};

use super::audit::{AuditHandle, AuditRecorder, AuditSink, JsonlAuditStore, RetryPolicy};
use super::decision::{DecisionEngine, Signals};
use super::input::InputLimits;
use super::similarity::{SimilarityScorer, DEFAULT_EMBEDDING_TIMEOUT};

pub const DEFAULT_PROPOSAL_TIMEOUT: Duration = Duration::from_secs(60);

/// A finished verdict plus its pending audit write
pub struct Governed {
    pub result: ValidationResult,

    /// Set when the proposal came from the configured provider
    pub proposal: Option<Proposal>,
    pub audit: AuditHandle,
}

/// Main governance engine
pub struct Governor {
    validators: Arc<Validators>,
    scorer: SimilarityScorer,
    engine: DecisionEngine,
    recorder: Arc<AuditRecorder>,
    limits: InputLimits,
    proposer: Option<Arc<dyn ProposalProvider>>,
    proposal_timeout: Duration,
    document_scan: bool,
}

impl Governor {
    pub fn builder(
        embeddings: Arc<dyn EmbeddingProvider>,
        audit_sink: Arc<dyn AuditSink>,
    ) -> GovernorBuilder {
        GovernorBuilder {
            embeddings,
            audit_sink,
            thresholds: Thresholds::default(),
            limits: InputLimits::default(),
            lexicon: Lexicon::default(),
            polarity: PolarityMatch::default(),
            embedding_timeout: DEFAULT_EMBEDDING_TIMEOUT,
            retry: RetryPolicy::default(),
            proposer: None,
            proposal_timeout: DEFAULT_PROPOSAL_TIMEOUT,
            document_scan: false,
        }
    }

    /// Build providers, audit store and validators from resolved configuration
    pub async fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let embeddings: Arc<dyn EmbeddingProvider> = match config.embeddings.provider {
            EmbeddingBackend::Hashing => Arc::new(HashingEmbeddings::new(config.embeddings.dimensions)),
            EmbeddingBackend::OpenAi => {
                let key = config
                    .api_key
                    .clone()
                    .context("OpenAI embeddings configured but OPENAI_API_KEY is not set")?;
                Arc::new(
                    OpenAiEmbeddings::new(key)
                        .with_base_url(&config.embeddings.base_url)
                        .with_model(&config.embeddings.model),
                )
            }
        };

        let proposer: Arc<dyn ProposalProvider> = match config.proposals.provider {
            ProposalBackend::Placeholder => Arc::new(PlaceholderProposer::new()),
            ProposalBackend::OpenAi => {
                let key = config
                    .api_key
                    .clone()
                    .context("OpenAI proposals configured but OPENAI_API_KEY is not set")?;
                Arc::new(
                    OpenAiProposer::new(key)
                        .with_base_url(&config.proposals.base_url)
                        .with_model(&config.proposals.model),
                )
            }
        };

        let store = JsonlAuditStore::open(&config.audit_log).await?;

        let governor = Self::builder(embeddings, Arc::new(store))
            .thresholds(config.thresholds)
            .input_limits(config.input.clone())
            .lexicon(Lexicon::default().extended(&config.extra_markers))
            .polarity_mode(config.polarity)
            .embedding_timeout(Duration::from_secs(config.embeddings.timeout_seconds))
            .retry_policy(config.audit_retry.clone())
            .proposer(proposer)
            .proposal_timeout(Duration::from_secs(config.proposals.timeout_seconds))
            .document_scan(config.document_scan)
            .build()?;

        Ok(governor)
    }

    pub fn thresholds(&self) -> &Thresholds {
        self.engine.thresholds()
    }

    /// Judge a caller-supplied proposal
    #[instrument(skip_all, fields(user_id = %request.user_id, intent = %request.intent))]
    pub async fn validate(&self, request: ValidationRequest) -> GovernanceResult<Governed> {
        self.limits.validate_original(&request.original_text)?;
        self.govern(request, None).await
    }

    /// Ask the configured provider for a proposal, then judge it
    #[instrument(skip(self, original), fields(original_chars = original.chars().count()))]
    pub async fn rewrite(
        &self,
        original: &str,
        intent: Intent,
        user_id: &str,
    ) -> GovernanceResult<Governed> {
        self.limits.validate_original(original)?;

        let proposer = self
            .proposer
            .as_ref()
            .ok_or_else(|| GovernanceError::Config("no proposal provider configured".to_string()))?;

        // A provider failure is judged as an unusable (empty) proposal
        let proposal = match timeout(self.proposal_timeout, proposer.propose(original, intent)).await {
            Ok(Ok(proposal)) => proposal,
            Ok(Err(e)) => {
                warn!(provider = proposer.name(), error = %e, "Proposal provider failed");
                Proposal {
                    proposed_text: String::new(),
                    explanation: String::new(),
                }
            }
            Err(_) => {
                warn!(
                    provider = proposer.name(),
                    timeout_secs = self.proposal_timeout.as_secs(),
                    "Proposal provider timed out"
                );
                Proposal {
                    proposed_text: String::new(),
                    explanation: String::new(),
                }
            }
        };

        let request =
            ValidationRequest::new(original, proposal.proposed_text.clone(), intent, user_id);
        self.govern(request, Some(proposal)).await
    }

    async fn govern(
        &self,
        request: ValidationRequest,
        proposal: Option<Proposal>,
    ) -> GovernanceResult<Governed> {
        let started = Instant::now();

        let proposal_usable = match check_proposal(&request.original_text, &request.proposed_text) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Proposal rejected before validation");
                false
            }
        };

        // Fan out: pure validators on a blocking worker, embeddings on the runtime
        let pure = {
            let validators = Arc::clone(&self.validators);
            let original = request.original_text.clone();
            let proposed = request.proposed_text.clone();
            let document_scan = self.document_scan;
            tokio::task::spawn_blocking(move || {
                let signals = validators.analyze_pair(&original, &proposed);
                let quality = document_scan.then(|| validators.document().compare(&original, &proposed));
                (signals, quality)
            })
        };

        let similarity = async {
            if proposal_usable {
                Some(
                    self.scorer
                        .score(&request.original_text, &request.proposed_text)
                        .await,
                )
            } else {
                None
            }
        };

        // Fan in: wait for every signal
        let (pure, similarity) = tokio::join!(pure, similarity);

        let (signals, document_quality): (PairSignals, Option<DocumentComparison>) = match pure {
            Ok(outcome) => outcome,
            Err(e) => match e.try_into_panic() {
                Ok(payload) => std::panic::resume_unwind(payload),
                Err(e) => return Err(GovernanceError::Interrupted(e.to_string())),
            },
        };

        let similarity_score = match similarity {
            Some(Ok(score)) => Some(score),
            Some(Err(e)) => {
                warn!(error = %e, "Similarity unavailable, failing closed");
                None
            }
            None => None,
        };

        let verdict = self.engine.decide(&Signals {
            proposal_usable,
            entity_preserved: signals.entity_preserved,
            polarity_flip: signals.polarity_flip,
            similarity: similarity_score,
            tone: &signals.tone,
            needs_review: signals.claims.proposed.needs_review,
        });

        let result = ValidationResult {
            similarity_score,
            risk_label: verdict.risk_label,
            entity_preserved: signals.entity_preserved,
            entity_drift: signals.entity_drift,
            polarity_flip: signals.polarity_flip,
            tone_analysis: signals.tone,
            claim_report: signals.claims.proposed,
            introduced_claims: signals.claims.introduced,
            validation_flags: verdict.flags,
            decision: verdict.decision,
            decision_reason: verdict.reason,
            document_quality,
        };

        let audit = self.recorder.spawn(&request, &result);

        info!(
            audit_id = %audit.audit_id(),
            decision = %result.decision,
            risk_label = %result.risk_label,
            similarity = ?result.similarity_score,
            flags = result.validation_flags.len(),
            original_chars = request.original_text.chars().count(),
            proposed_chars = request.proposed_text.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Verdict reached"
        );

        Ok(Governed {
            result,
            proposal,
            audit,
        })
    }
}

/// Step-by-step construction of a [`Governor`]
pub struct GovernorBuilder {
    embeddings: Arc<dyn EmbeddingProvider>,
    audit_sink: Arc<dyn AuditSink>,
    thresholds: Thresholds,
    limits: InputLimits,
    lexicon: Lexicon,
    polarity: PolarityMatch,
    embedding_timeout: Duration,
    retry: RetryPolicy,
    proposer: Option<Arc<dyn ProposalProvider>>,
    proposal_timeout: Duration,
    document_scan: bool,
}

impl GovernorBuilder {
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn input_limits(mut self, limits: InputLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    pub fn polarity_mode(mut self, mode: PolarityMatch) -> Self {
        self.polarity = mode;
        self
    }

    pub fn embedding_timeout(mut self, timeout: Duration) -> Self {
        self.embedding_timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn proposer(mut self, proposer: Arc<dyn ProposalProvider>) -> Self {
        self.proposer = Some(proposer);
        self
    }

    pub fn proposal_timeout(mut self, timeout: Duration) -> Self {
        self.proposal_timeout = timeout;
        self
    }

    pub fn document_scan(mut self, enabled: bool) -> Self {
        self.document_scan = enabled;
        self
    }

    pub fn build(self) -> GovernanceResult<Governor> {
        let engine = DecisionEngine::new(self.thresholds)?;
        let validators = Validators::new(&self.lexicon, self.polarity)
            .map_err(|e| GovernanceError::Config(format!("invalid lexicon pattern: {}", e)))?;

        Ok(Governor {
            validators: Arc::new(validators),
            scorer: SimilarityScorer::new(self.embeddings).with_timeout(self.embedding_timeout),
            engine,
            recorder: Arc::new(AuditRecorder::new(self.audit_sink, self.retry)),
            limits: self.limits,
            proposer: self.proposer,
            proposal_timeout: self.proposal_timeout,
            document_scan: self.document_scan,
        })
    }
}
