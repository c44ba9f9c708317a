//! Text rendering of session views

use std::io::{self, Write};

use shrep_core::{ReportAggregator, Session, VariantOracle};
use shrep_scan::variant_count;

/// Passes, keyword groups with their options, and the vocabulary
pub fn write_keywords<O: VariantOracle>(
    out: &mut impl Write,
    session: &Session<O>,
) -> io::Result<()> {
    let Some(shader) = session.shader() else {
        return writeln!(out, "No shader selected");
    };
    writeln!(out, "Shader: {} ({} passes)", shader.name(), session.passes().len())?;

    let active = session.selection().active_pass();
    for (index, pass) in session.passes().iter().enumerate() {
        let stages: Vec<String> = pass.stages().iter().map(ToString::to_string).collect();
        let marker = if active == Some(index) { '*' } else { ' ' };
        writeln!(
            out,
            "{marker}[{index}] {} (subshader {}, pass {}) stages: {}; {} variants",
            pass.name(),
            pass.subshader_index(),
            pass.pass_index(),
            stages.join(", "),
            variant_count(pass.keyword_groups())
        )?;

        for (group, hint) in pass.keyword_hints().iter().enumerate() {
            let family = pass.keyword_groups()[group].family().keyword();
            writeln!(out, "    group {group} ({family}): {hint}")?;
            for (option, label) in pass.option_labels(group).unwrap_or_default().iter().enumerate() {
                writeln!(out, "        {option}: {label}")?;
            }
        }
    }

    let vocabulary: Vec<&str> = session.vocabulary().iter().collect();
    writeln!(out, "Keywords ({}): {}", vocabulary.len(), vocabulary.join(" "))?;
    Ok(())
}

/// One headed block per reported stage, in stage order
pub fn write_reports(out: &mut impl Write, reports: &ReportAggregator) -> io::Result<()> {
    if reports.is_empty() {
        return writeln!(out, "No reports");
    }
    for (stage, report) in reports.render_in_order() {
        writeln!(out, "=== {} ===", stage.label())?;
        out.write_all(report.text().as_bytes())?;
        if !report.text().is_empty() && !report.text().ends_with('\n') {
            writeln!(out)?;
        }
        if let Some(code) = report.exit_code().filter(|&code| code != 0) {
            writeln!(out, "(compiler exited with code {code})")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shrep_core::{CompilerTarget, ShaderAsset, Stage, StageReport, StageReports, VariantSettings};

    fn render_keywords(session: &Session) -> String {
        let mut out = Vec::new();
        write_keywords(&mut out, session).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn keywords_list_groups_and_vocabulary() {
        let mut session = Session::new(CompilerTarget::Malioc, VariantSettings::default());
        session.select_shader(Some(ShaderAsset::from_source(
            "lit",
            "#pragma multi_compile A B\n#pragma shader_feature FOG\n",
        )));

        let text = render_keywords(&session);
        assert!(text.starts_with("Shader: lit (1 passes)\n"));
        assert!(text.contains("*[0] lit (subshader 0, pass 0) stages: vertex, fragment; 4 variants"));
        assert!(text.contains("    group 1 (shader_feature): FOG\n        0: No keyword applied\n        1: FOG\n"));
        assert!(text.ends_with("Keywords (3): A B FOG\n"));
    }

    #[test]
    fn keywords_without_shader() {
        let session = Session::new(CompilerTarget::Malioc, VariantSettings::default());
        assert_eq!(render_keywords(&session), "No shader selected\n");
    }

    #[test]
    fn reports_in_stage_order_with_exit_codes() {
        let mut reports = StageReports::new();
        reports.insert(
            Stage::Fragment,
            StageReport::Compiled {
                text: "frag ok\n".to_string(),
                exit_code: Some(0),
            },
        );
        reports.insert(
            Stage::Vertex,
            StageReport::Compiled {
                text: "vert broke\n".to_string(),
                exit_code: Some(1),
            },
        );
        let mut aggregator = ReportAggregator::new();
        aggregator.replace_all(reports);

        let mut out = Vec::new();
        write_reports(&mut out, &aggregator).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "=== Vertex Shader ===\nvert broke\n(compiler exited with code 1)\n=== Fragment Shader ===\nfrag ok\n"
        );
    }
}
