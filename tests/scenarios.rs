//! Governance Scenario Integration Tests
//!
//! End-to-end verdicts through the governor with scripted similarity.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use rewrite_guard::adapters::{EmbeddingProvider, PlaceholderProposer};
use rewrite_guard::core::AuditSink;
use rewrite_guard::{
    AuditRecord, Decision, GovernanceError, Governor, Intent, RiskLabel, Thresholds,
    ValidationFlag, ValidationRequest,
};

/// Embeds the original as [1, 0] and anything else at a fixed cosine from it
struct ScriptedEmbeddings {
    original: String,
    similarity: f64,
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbeddings {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        if text == self.original {
            Ok(vec![1.0, 0.0])
        } else {
            let s = self.similarity;
            Ok(vec![s, (1.0 - s * s).max(0.0).sqrt()])
        }
    }
}

/// Never answers within any reasonable timeout
struct StalledEmbeddings;

#[async_trait]
impl EmbeddingProvider for StalledEmbeddings {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f64>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec![1.0, 0.0])
    }
}

#[derive(Default)]
struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

#[async_trait]
impl AuditSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, record: &AuditRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

fn governor(original: &str, similarity: f64) -> (Governor, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    let governor = Governor::builder(
        Arc::new(ScriptedEmbeddings {
            original: original.to_string(),
            similarity,
        }),
        sink.clone(),
    )
    .build()
    .unwrap();
    (governor, sink)
}

#[tokio::test]
async fn test_scenario_a_faithful_rewrite_is_allowed() {
    let original = "The study found a 25% increase in 2023.";
    let proposed = "The study found a 25% increase in 2023, which is notable.";
    let (governor, sink) = governor(original, 0.93);

    let governed = governor
        .validate(ValidationRequest::new(original, proposed, Intent::Rewrite, "alice"))
        .await
        .unwrap();
    let result = &governed.result;

    assert!(result.entity_preserved);
    assert!(!result.polarity_flip);
    assert!(!result.claim_report.needs_review);
    assert!(result.tone_analysis.preserved);
    assert_eq!(result.decision, Decision::Allowed);
    assert_eq!(result.decision_reason, "all semantic invariants preserved.");
    assert!(result.validation_flags.is_empty());
    assert_eq!(result.risk_label, RiskLabel::Safe);

    let record = governed.audit.wait().await.unwrap();
    assert_eq!(record.decision, Decision::Allowed);
    assert_eq!(sink.records.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_scenario_b_negation_removed_is_blocked() {
    let original = "Sales did not decline in 2022.";
    let proposed = "Sales declined in 2022.";
    let (governor, _) = governor(original, 0.91);

    let governed = governor
        .validate(ValidationRequest::new(original, proposed, Intent::Rewrite, "alice"))
        .await
        .unwrap();
    let result = &governed.result;

    assert!(result.entity_preserved);
    assert!(result.polarity_flip);
    assert_eq!(result.decision, Decision::Blocked);
    assert_eq!(result.decision_reason, "meaning polarity reversed.");
    assert!(result.has_flag(ValidationFlag::PolarityFlip));
}

#[tokio::test]
async fn test_negation_with_typographic_apostrophe_is_blocked() {
    let original = "Sales didn\u{2019}t decline in 2022.";
    let proposed = "Sales declined in 2022.";
    let (governor, _) = governor(original, 0.95);

    let governed = governor
        .validate(ValidationRequest::new(original, proposed, Intent::Rewrite, "alice"))
        .await
        .unwrap();

    assert!(governed.result.polarity_flip);
    assert_eq!(governed.result.decision, Decision::Blocked);
    assert_eq!(governed.result.decision_reason, "meaning polarity reversed.");
}

#[tokio::test]
async fn test_scenario_c_uncited_causal_claim_warns() {
    let original = "Smoking causes lung disease in most long-term users.";
    let proposed = "Smoking causes lung disease in the majority of long-term users.";
    let (governor, _) = governor(original, 0.92);

    let governed = governor
        .validate(ValidationRequest::new(original, proposed, Intent::Clarify, "bob"))
        .await
        .unwrap();
    let result = &governed.result;

    assert!(result.claim_report.needs_review);
    assert_eq!(result.decision, Decision::AllowedWithWarning);
    assert_eq!(result.validation_flags, vec![ValidationFlag::UncitedClaims]);
    assert!(result.decision_reason.contains("citations"));
    assert_eq!(result.risk_label, RiskLabel::Safe);
}

#[tokio::test]
async fn test_scenario_d_embedding_timeout_fails_closed() {
    let sink = Arc::new(MemorySink::default());
    let governor = Governor::builder(Arc::new(StalledEmbeddings), sink.clone())
        .embedding_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let governed = governor
        .validate(ValidationRequest::new(
            "The study found a 25% increase in 2023.",
            "The study found a 25% rise in 2023.",
            Intent::Rewrite,
            "carol",
        ))
        .await
        .unwrap();
    let result = &governed.result;

    assert_eq!(result.similarity_score, None);
    assert_eq!(result.risk_label, RiskLabel::Dangerous);
    assert_eq!(result.decision, Decision::Blocked);
    assert_eq!(result.decision_reason, "semantic drift exceeds safety bound.");
    assert!(result.has_flag(ValidationFlag::EmbeddingUnavailable));

    // The degraded verdict is still audited
    let record = governed.audit.wait().await.unwrap();
    assert_eq!(record.similarity_score, None);
    assert_eq!(record.decision, Decision::Blocked);
}

#[tokio::test]
async fn test_changed_number_blocks_despite_high_similarity() {
    let original = "Revenue rose 12% in 2021 across all regions.";
    let proposed = "Revenue rose 15% in 2021 across all regions.";
    let (governor, _) = governor(original, 0.99);

    let governed = governor
        .validate(ValidationRequest::new(original, proposed, Intent::Rewrite, "alice"))
        .await
        .unwrap();
    let result = &governed.result;

    assert!(!result.entity_preserved);
    assert_eq!(result.decision, Decision::Blocked);
    assert_eq!(result.decision_reason, "entity/invariant drift detected.");
    assert_eq!(result.entity_drift.missing, vec!["12%".to_string()]);
    assert_eq!(result.entity_drift.added, vec!["15%".to_string()]);
}

#[tokio::test]
async fn test_similarity_monotonicity() {
    let original = "The committee reviewed the proposal on Tuesday.";
    let proposed = "The committee looked over the proposal on Tuesday.";

    let mut decisions = Vec::new();
    for similarity in [0.90, 0.70, 0.50] {
        let (governor, _) = governor(original, similarity);
        let governed = governor
            .validate(ValidationRequest::new(original, proposed, Intent::Rewrite, "alice"))
            .await
            .unwrap();
        decisions.push(governed.result.decision);
    }

    assert_eq!(
        decisions,
        vec![Decision::Allowed, Decision::AllowedWithWarning, Decision::Blocked]
    );
}

#[tokio::test]
async fn test_custom_thresholds_move_the_bands() {
    let original = "The committee reviewed the proposal on Tuesday.";
    let proposed = "The committee looked over the proposal on Tuesday.";
    let governor = Governor::builder(
        Arc::new(ScriptedEmbeddings {
            original: original.to_string(),
            similarity: 0.90,
        }),
        Arc::new(MemorySink::default()),
    )
    .thresholds(Thresholds {
        safe: 0.95,
        risky: 0.80,
    })
    .build()
    .unwrap();

    assert_eq!(governor.thresholds().safe, 0.95);
    assert_eq!(governor.thresholds().risky, 0.80);

    let governed = governor
        .validate(ValidationRequest::new(original, proposed, Intent::Rewrite, "alice"))
        .await
        .unwrap();

    // 0.90 is safe under the defaults but risky here
    assert_eq!(governed.result.risk_label, RiskLabel::Risky);
    assert_eq!(governed.result.decision, Decision::AllowedWithWarning);
}

#[tokio::test]
async fn test_blank_proposal_is_blocked_not_an_error() {
    let original = "The committee reviewed the proposal on Tuesday.";
    let (governor, _) = governor(original, 0.99);

    let governed = governor
        .validate(ValidationRequest::new(original, "   ", Intent::Rewrite, "alice"))
        .await
        .unwrap();
    let result = &governed.result;

    assert_eq!(result.decision, Decision::Blocked);
    assert_eq!(result.decision_reason, "no usable proposal produced.");
    assert_eq!(result.validation_flags[0], ValidationFlag::NoUsableProposal);
    assert!(!result.has_flag(ValidationFlag::EmbeddingUnavailable));
}

#[tokio::test]
async fn test_out_of_bounds_input_never_reaches_the_engine() {
    let (governor, sink) = governor("too short", 0.99);

    let err = governor
        .validate(ValidationRequest::new("too short", "far too short", Intent::Rewrite, "alice"))
        .await
        .err()
        .unwrap();

    assert!(matches!(
        err,
        GovernanceError::InputOutOfBounds { actual: 9, min: 20, max: 1800 }
    ));
    assert!(sink.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rewrite_with_placeholder_provider() {
    let original = "We met in order to plan the budget for next year.";
    let sink = Arc::new(MemorySink::default());
    let governor = Governor::builder(
        Arc::new(ScriptedEmbeddings {
            original: original.to_string(),
            similarity: 0.95,
        }),
        sink.clone(),
    )
    .proposer(Arc::new(PlaceholderProposer::new()))
    .build()
    .unwrap();

    let governed = governor.rewrite(original, Intent::Clarify, "dave").await.unwrap();

    let proposal = governed.proposal.as_ref().unwrap();
    assert_eq!(proposal.proposed_text, "We met to plan the budget for next year.");
    assert_eq!(governed.result.decision, Decision::Allowed);

    let record = governed.audit.wait().await.unwrap();
    assert_eq!(record.action_type, Intent::Clarify);
    assert_eq!(record.user_id, "dave");
}

#[tokio::test]
async fn test_rewrite_without_provider_is_a_config_error() {
    let original = "We met in order to plan the budget for next year.";
    let (governor, _) = governor(original, 0.95);

    let result = governor.rewrite(original, Intent::Clarify, "dave").await;
    assert!(matches!(result, Err(GovernanceError::Config(_))));
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let original = "Sales did not decline in 2022.";
    let (governor, sink) = governor(original, 0.91);
    let governor = Arc::new(governor);

    let mut handles = Vec::new();
    for i in 0..16 {
        let governor = Arc::clone(&governor);
        let proposed = if i % 2 == 0 {
            "Sales did not fall in 2022."
        } else {
            "Sales declined in 2022."
        };
        handles.push(tokio::spawn(async move {
            let governed = governor
                .validate(ValidationRequest::new(
                    original,
                    proposed,
                    Intent::Rewrite,
                    format!("user-{}", i),
                ))
                .await
                .unwrap();
            let decision = governed.result.decision;
            governed.audit.wait().await.unwrap();
            (i, decision)
        }));
    }

    for handle in handles {
        let (i, decision) = handle.await.unwrap();
        let expected = if i % 2 == 0 {
            Decision::Allowed
        } else {
            Decision::Blocked
        };
        assert_eq!(decision, expected, "request {}", i);
    }
    assert_eq!(sink.records.lock().unwrap().len(), 16);
}

#[tokio::test]
async fn test_document_scan_attached_when_enabled() {
    let original = "The team shipped the release. However, two bugs remained open.";
    let proposed = "The team shipped the release. However, two bugs stayed open.";
    let sink = Arc::new(MemorySink::default());
    let governor = Governor::builder(
        Arc::new(ScriptedEmbeddings {
            original: original.to_string(),
            similarity: 0.95,
        }),
        sink,
    )
    .document_scan(true)
    .build()
    .unwrap();

    let governed = governor
        .validate(ValidationRequest::new(original, proposed, Intent::Rewrite, "erin"))
        .await
        .unwrap();

    let quality = governed.result.document_quality.as_ref().unwrap();
    assert!(quality.quality_maintained);
    assert_eq!(governed.result.decision, Decision::Allowed);
}
