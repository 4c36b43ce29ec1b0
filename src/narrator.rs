//! # Response narrator
//!
//! Turns an [`AnalysisReport`] into a short markdown message for the student. This is a
//! formatting layer only; all decisions were made upstream.
//!
//! Score bands:
//!
//! | Score    | Band        | Warnings shown |
//! |----------|-------------|----------------|
//! | >= 90    | very good   | no             |
//! | 60..=89  | careful     | yes            |
//! | < 60     | risky       | yes            |

use crate::engine::AnalysisReport;
use crate::models::{RecommendationItem, RecommendationSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyBand {
    VeryGood,
    Careful,
    Risky,
}

impl SafetyBand {
    pub fn from_score(score: i32) -> Self {
        if score >= 90 {
            SafetyBand::VeryGood
        } else if score >= 60 {
            SafetyBand::Careful
        } else {
            SafetyBand::Risky
        }
    }

    fn label(self) -> &'static str {
        match self {
            SafetyBand::VeryGood => "VERY GOOD",
            SafetyBand::Careful => "CAREFUL",
            SafetyBand::Risky => "RISKY",
        }
    }

    fn verdict(self) -> &'static str {
        match self {
            SafetyBand::VeryGood => "Your text is safe to post. No personal data leaks.",
            SafetyBand::Careful => "A few things are worth fixing before you post:",
            SafetyBand::Risky => "Stop! Don't post this yet. It could hurt you:",
        }
    }
}

/// Render `report` as markdown, greeting `display_name` when given.
pub fn narrate(report: &AnalysisReport, display_name: Option<&str>) -> String {
    let mut out = String::new();
    let scan = &report.scan;
    let band = SafetyBand::from_score(scan.safety_score);

    if let Some(name) = display_name {
        out.push_str(&format!("Hi **{name}**!\n\n"));
    }

    out.push_str("## Safety check\n");
    out.push_str(&format!(
        "**Safety score: {}/100 ({})**\n{}\n",
        scan.safety_score,
        band.label(),
        band.verdict()
    ));
    if band != SafetyBand::VeryGood {
        for warning in &scan.warnings {
            out.push_str(&format!("- {warning}\n"));
        }
    }

    if !scan.anxiety_keywords.is_empty() {
        out.push_str(&format!(
            "\nIt sounds like you're feeling *{}*. That's okay. The books below might keep you company.\n",
            scan.anxiety_keywords.join(", ")
        ));
    }

    out.push_str("\n## Recommendations\n");
    if report.recommendations.is_empty() {
        out.push_str(
            "Nothing fits yet. Try telling more, e.g. about a hobby, a dream job or a favourite subject.\n",
        );
        return out;
    }

    out.push_str(&format!(
        "Found **{}** reads that match your story:\n\n",
        report.recommendations.len()
    ));
    for item in &report.recommendations {
        out.push_str(&render_item(item));
    }
    out
}

fn render_item(item: &RecommendationItem) -> String {
    let mut lines = vec![format!("### {}", item.title())];
    match &item.source {
        RecommendationSource::Local(entry) => {
            lines.push(format!("Author: {}", entry.author));
            lines.push(format!("Category: {}", entry.category));
            if let Some(competency) = &entry.competency {
                lines.push(format!("Competency: *{competency}*"));
            }
            lines.push(format!("Location: shelf `{}` (school library)", entry.shelf));
            if item.personalized {
                lines.push("*Picked for your interests*".to_string());
            }
        }
        RecommendationSource::External(reference) => {
            lines.push(format!("Author: {}", reference.author));
            lines.push(format!("Published in: {}", reference.publication));
            lines.push(match &reference.link {
                Some(link) => format!("Read the source: `{link}`"),
                None => format!("Online source ({})", reference.category()),
            });
        }
    }
    lines.join("\n") + "\n\n"
}
