//! Terminal output formatting for run summaries.

use colored::Colorize;

use crate::result::{ConnectivityResult, VariantResult};

/// Format a ConnectivityResult for human-readable terminal output.
pub fn format_result(result: &ConnectivityResult) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);

    output.push_str("fconn\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!(
        "  Input: {} timepoints \u{00D7} {} units, {} confounds, {} regions\n",
        result.metadata.timepoints,
        result.metadata.units,
        result.metadata.confounds,
        result.metadata.regions,
    ));
    output.push_str(&format!(
        "  Scrub: {} of {} timepoints retained ({} removed)\n",
        result.scrub.retained, result.scrub.total, result.scrub.removed,
    ));
    output.push('\n');

    if result.metadata.warnings.is_empty() {
        output.push_str(&format!("  {}\n", "\u{2713} No warnings".green()));
    } else {
        for warning in &result.metadata.warnings {
            let line = warning.description();
            if warning.is_critical() {
                output.push_str(&format!("  {} {}\n", "\u{26A0}".yellow().bold(), line));
            } else {
                output.push_str(&format!("  \u{2022} {line}\n"));
            }
        }
    }
    output.push('\n');

    format_variant(&mut output, &result.without_global_signal, "Without GSR");
    format_variant(&mut output, &result.with_global_signal, "With GSR");

    output.push_str(&sep);
    output.push('\n');
    output.push_str(&format!(
        "Completed in {:.1} ms\n",
        result.metadata.elapsed_ms
    ));
    output
}

fn format_variant(output: &mut String, variant: &VariantResult, title: &str) {
    output.push_str(&format!("  {}\n", title.bold()));
    output.push_str(&format!(
        "    Regions kept: {} ({} excluded as degenerate)\n",
        variant.full_correlation.regions(),
        variant.full_correlation.excluded().len(),
    ));
    output.push_str(&format!(
        "    Edge density: {:.4} requested, {:.4} realized (cutoff {:.3})\n",
        variant.thresholded.requested_density(),
        variant.thresholded.realized_density(),
        variant.thresholded.cutoff(),
    ));
    output.push_str(&format!(
        "    Giant component: {} of {} nodes\n",
        variant.giant_component.retained, variant.giant_component.total,
    ));
    output.push_str(&format!(
        "    Binary communities: {} (Q = {:.4})\n",
        variant.communities_binary.communities(),
        variant.communities_binary.modularity(),
    ));
    output.push_str(&format!(
        "    Signed communities: {} (Q = {:.4})\n",
        variant.communities_signed.communities(),
        variant.communities_signed.modularity(),
    ));
    output.push('\n');
}
