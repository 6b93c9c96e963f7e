//! Recovery of the exact CURIE prefix for namespaces that embed their prefix
//! in the local unique identifier (for example `CHEBI:36927`).
//!
//! The registry stores such prefixes lower-cased, so the capitalization a
//! CURIE requires has to be read back from an example identifier.

use regex_syntax::hir::{Class, Hir, HirKind};

use crate::error::CurieError;

/// Produces one string matching a registry identifier pattern.
pub trait PatternSampler {
    fn sample(&self, pattern: &str) -> Result<String, CurieError>;
}

/// Deterministic sampler emitting the shortest example a pattern allows.
///
/// When the shortest example has no `:`, optional groups and alternation
/// branches that contain a literal `:` are taken instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalSampler;

impl PatternSampler for MinimalSampler {
    fn sample(&self, pattern: &str) -> Result<String, CurieError> {
        let invalid = |reason: String| CurieError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };
        let hir = regex_syntax::Parser::new()
            .parse(pattern)
            .map_err(|err| invalid(err.to_string()))?;

        let mut out = String::new();
        write_example(&hir, Mode::Shortest, &mut out).map_err(invalid)?;
        if !out.contains(':') && has_literal_colon(&hir) {
            out.clear();
            write_example(&hir, Mode::ReachColon, &mut out).map_err(invalid)?;
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Shortest,
    ReachColon,
}

fn write_example(hir: &Hir, mode: Mode, out: &mut String) -> Result<(), String> {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => Ok(()),
        HirKind::Literal(literal) => {
            out.push_str(&String::from_utf8_lossy(&literal.0));
            Ok(())
        }
        HirKind::Class(Class::Unicode(class)) => {
            let ch = pick_char(
                class
                    .ranges()
                    .iter()
                    .map(|range| (range.start(), range.end())),
            )
            .ok_or_else(|| "character class matches nothing".to_string())?;
            out.push(ch);
            Ok(())
        }
        HirKind::Class(Class::Bytes(class)) => {
            let ch = pick_char(
                class
                    .ranges()
                    .iter()
                    .map(|range| (char::from(range.start()), char::from(range.end()))),
            )
            .ok_or_else(|| "byte class matches nothing".to_string())?;
            out.push(ch);
            Ok(())
        }
        HirKind::Repetition(repetition) => {
            let mut count = repetition.min;
            if count == 0
                && mode == Mode::ReachColon
                && repetition.max != Some(0)
                && has_literal_colon(&repetition.sub)
            {
                count = 1;
            }
            for _ in 0..count {
                write_example(&repetition.sub, mode, out)?;
            }
            Ok(())
        }
        HirKind::Capture(capture) => write_example(&capture.sub, mode, out),
        HirKind::Concat(items) => items
            .iter()
            .try_for_each(|item| write_example(item, mode, out)),
        HirKind::Alternation(branches) => {
            let branch = match mode {
                Mode::Shortest => branches.first(),
                Mode::ReachColon => branches
                    .iter()
                    .find(|branch| has_literal_colon(branch))
                    .or_else(|| branches.first()),
            };
            match branch {
                Some(branch) => write_example(branch, mode, out),
                None => Ok(()),
            }
        }
    }
}

/// Whether some match of `hir` contains a literal `:`.
fn has_literal_colon(hir: &Hir) -> bool {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) | HirKind::Class(_) => false,
        HirKind::Literal(literal) => literal.0.contains(&b':'),
        HirKind::Repetition(repetition) => {
            repetition.max != Some(0) && has_literal_colon(&repetition.sub)
        }
        HirKind::Capture(capture) => has_literal_colon(&capture.sub),
        HirKind::Concat(items) | HirKind::Alternation(items) => items.iter().any(has_literal_colon),
    }
}

/// First printable ASCII member of a class, else its first member.
fn pick_char(ranges: impl Iterator<Item = (char, char)> + Clone) -> Option<char> {
    let printable = ranges.clone().find_map(|(start, end)| {
        (start..=end)
            .take(128)
            .find(|ch| ch.is_ascii_graphic())
    });
    printable.or_else(|| ranges.map(|(start, _)| start).next())
}

/// Where the capitalization of an embedded prefix is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CapitalizationStrategy {
    /// Registry-supplied `sampleId`, falling back to a sampled pattern.
    #[default]
    SampleIdFirst,
    /// Always sample the pattern.
    PatternOnly,
}

/// Compute the `curiePrefix` of a namespace.
///
/// Non-embedded namespaces use their registry prefix untouched.
pub fn derive_curie_prefix(
    prefix: &str,
    pattern: &str,
    sample_id: Option<&str>,
    embedded_in_lui: bool,
    sampler: &dyn PatternSampler,
    strategy: CapitalizationStrategy,
) -> Result<String, CurieError> {
    if !embedded_in_lui {
        return Ok(prefix.to_string());
    }

    let sample = sample_id.filter(|sample| sample.contains(':'));
    let example = match (strategy, sample) {
        (CapitalizationStrategy::SampleIdFirst, Some(sample)) => sample.to_string(),
        _ => sampler.sample(pattern).map_err(|err| match err {
            CurieError::InvalidPattern { reason, .. } => CurieError::defect(
                prefix,
                format!("pattern {pattern} cannot be sampled: {reason}"),
            ),
            other => other,
        })?,
    };

    match example.split_once(':') {
        Some((curie_prefix, _)) if !curie_prefix.is_empty() => Ok(curie_prefix.to_string()),
        _ => Err(CurieError::defect(
            prefix,
            format!("no prefix derivable from example identifier {example:?}"),
        )),
    }
}
