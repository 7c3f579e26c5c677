//! `IterativeEvaluator`: aggregates per-document evaluations into a
//! `SearchEvaluation`, decides sufficiency, and produces refined task
//! copies for the next search iteration.

use std::collections::HashSet;

use research_core::{
    DocumentEvaluation, Relevance, SearchEvaluation, SubagentTask, MAX_CANDIDATES_RANGE,
    MAX_KEYWORDS, SIMILARITY_THRESHOLD_RANGE,
};

const SUFFICIENT_RELEVANCE: f32 = 0.65;
const SUFFICIENT_COVERAGE: f32 = 0.75;
const MAX_CRITICAL_GAPS: usize = 2;

pub struct IterativeEvaluator;

impl IterativeEvaluator {
    pub fn evaluate(task: &SubagentTask, doc_evals: Vec<DocumentEvaluation>) -> SearchEvaluation {
        let overall_relevance = weighted_relevance(&doc_evals);
        let coverage_completeness = coverage_completeness(task, &doc_evals);
        let gaps = find_gaps(task, &doc_evals, overall_relevance, coverage_completeness);
        let refinement_suggestions = suggest_refinements(&doc_evals, &gaps);
        let critical_gaps = gaps
            .iter()
            .filter(|g| g.contains("uncovered") || g.contains("relevant"))
            .count();
        let sufficient = overall_relevance >= SUFFICIENT_RELEVANCE
            && coverage_completeness >= SUFFICIENT_COVERAGE
            && critical_gaps <= MAX_CRITICAL_GAPS;
        let next_keywords = extract_next_keywords(&gaps, &refinement_suggestions);
        let synthesis_guidance = build_synthesis_guidance(&doc_evals, overall_relevance, coverage_completeness);

        SearchEvaluation {
            doc_evals,
            overall_relevance,
            coverage_completeness,
            gaps,
            refinement_suggestions,
            sufficient,
            next_keywords,
            synthesis_guidance,
        }
    }

    /// Produce a refined copy of `task`, never mutating in place.
    pub fn refine_task(task: &SubagentTask, eval: &SearchEvaluation) -> SubagentTask {
        let mut threshold = task.similarity_threshold;
        let mut max_candidates = task.max_candidates;

        for suggestion in &eval.refinement_suggestions {
            if suggestion.contains("lower threshold") {
                threshold -= 0.1;
            } else if suggestion.contains("add candidates") {
                max_candidates += 3;
            } else if suggestion.contains("cut candidates") {
                max_candidates = max_candidates.saturating_sub(2);
            }
        }

        threshold = threshold.clamp(SIMILARITY_THRESHOLD_RANGE.0, SIMILARITY_THRESHOLD_RANGE.1);
        max_candidates = max_candidates.clamp(MAX_CANDIDATES_RANGE.0, MAX_CANDIDATES_RANGE.1);

        let mut search_keywords = task.search_keywords.clone();
        let mut seen: HashSet<String> = search_keywords.iter().cloned().collect();
        for kw in &eval.next_keywords {
            if seen.insert(kw.clone()) {
                search_keywords.push(kw.clone());
            }
        }
        search_keywords.truncate(MAX_KEYWORDS);

        SubagentTask {
            specialist_type: task.specialist_type,
            focus_areas: task.focus_areas.clone(),
            search_keywords,
            semantic_context: task.semantic_context.clone(),
            expected_findings: task.expected_findings.clone(),
            similarity_threshold: threshold,
            max_candidates,
            priority: task.priority,
            iterative_refinement: true,
        }
    }
}

fn weighted_relevance(doc_evals: &[DocumentEvaluation]) -> f32 {
    if doc_evals.is_empty() {
        return 0.0;
    }
    let (weighted_sum, weight_sum) = doc_evals.iter().fold((0.0_f32, 0.0_f32), |(ws, w), d| {
        let weight = d.relevance.relevance_weight();
        (ws + d.quality_score * weight, w + weight)
    });
    if weight_sum == 0.0 {
        0.0
    } else {
        weighted_sum / weight_sum
    }
}

fn coverage_completeness(task: &SubagentTask, doc_evals: &[DocumentEvaluation]) -> f32 {
    if task.focus_areas.is_empty() {
        return 1.0;
    }
    let covered: HashSet<&String> = doc_evals.iter().flat_map(|d| d.coverage_areas.iter()).collect();
    covered.len() as f32 / task.focus_areas.len() as f32
}

fn find_gaps(
    task: &SubagentTask,
    doc_evals: &[DocumentEvaluation],
    overall_relevance: f32,
    coverage_completeness: f32,
) -> Vec<String> {
    let mut gaps = Vec::new();

    let covered: HashSet<&String> = doc_evals.iter().flat_map(|d| d.coverage_areas.iter()).collect();
    for area in &task.focus_areas {
        if !covered.contains(area) {
            gaps.push(format!("uncovered focus area: {area}"));
        }
    }

    if coverage_completeness < 1.0 && overall_relevance < 0.5 {
        gaps.push("average document quality is low".to_string());
    }

    let highly_relevant = doc_evals
        .iter()
        .filter(|d| d.relevance == Relevance::HighlyRelevant)
        .count();
    if highly_relevant == 0 {
        gaps.push("no highly relevant documents found".to_string());
    } else if highly_relevant == 1 && doc_evals.len() >= 4 {
        gaps.push("only a single highly relevant document among many candidates".to_string());
    }

    gaps
}

fn suggest_refinements(doc_evals: &[DocumentEvaluation], gaps: &[String]) -> Vec<String> {
    let mut suggestions = Vec::new();

    for gap in gaps {
        if gap.starts_with("uncovered focus area: ") {
            let area = gap.trim_start_matches("uncovered focus area: ");
            suggestions.push(format!("add keywords for uncovered area {area}"));
        } else if gap.contains("low") {
            suggestions.push("lower threshold to admit more candidates".to_string());
        } else if gap.contains("no highly relevant") {
            suggestions.push("refine query: no relevant documents found".to_string());
        }
    }

    if !doc_evals.is_empty() {
        let scores: Vec<f32> = doc_evals.iter().map(|d| d.quality_score).collect();
        let max = scores.iter().cloned().fold(f32::MIN, f32::max);
        let mean = scores.iter().sum::<f32>() / scores.len() as f32;
        if max - mean > 0.3 {
            suggestions.push("focus on top-scoring documents".to_string());
        }
    }

    if doc_evals.len() < 3 {
        suggestions.push("add candidates: too few results".to_string());
    } else if doc_evals.len() > 8 {
        suggestions.push("cut candidates: too many low-value results".to_string());
    }

    suggestions
}

fn extract_next_keywords(gaps: &[String], suggestions: &[String]) -> Vec<String> {
    let mut keywords = Vec::new();
    let mut seen = HashSet::new();

    for gap in gaps {
        if let Some(area) = gap.strip_prefix("uncovered focus area: ") {
            for token in area.split('_') {
                if seen.insert(token.to_string()) {
                    keywords.push(token.to_string());
                }
            }
        }
    }
    for suggestion in suggestions {
        if let Some(area) = suggestion.strip_prefix("add keywords for uncovered area ") {
            for token in area.split('_') {
                if seen.insert(token.to_string()) {
                    keywords.push(token.to_string());
                }
            }
        }
    }

    keywords.truncate(10);
    keywords
}

fn build_synthesis_guidance(doc_evals: &[DocumentEvaluation], overall_relevance: f32, coverage_completeness: f32) -> String {
    let highly = doc_evals.iter().filter(|d| d.relevance == Relevance::HighlyRelevant).count();
    let relevant = doc_evals.iter().filter(|d| d.relevance == Relevance::Relevant).count();
    let somewhat = doc_evals.iter().filter(|d| d.relevance == Relevance::SomewhatRelevant).count();

    let confidence_band = if overall_relevance >= 0.8 {
        "high confidence in retrieved evidence"
    } else if overall_relevance >= 0.6 {
        "moderate confidence in retrieved evidence"
    } else {
        "low confidence in retrieved evidence"
    };

    let mut guidance = format!(
        "{highly} highly relevant, {relevant} relevant, {somewhat} somewhat relevant document(s); {confidence_band}."
    );

    if coverage_completeness < 0.5 {
        guidance.push_str(" Coverage is partial; note missing focus areas in the final answer.");
    }

    guidance
}
