//! Narrowest-node hover resolution (§4.9).
//!
//! Grounded on `yaram/simple-compiler`'s `server.cpp` hover handler: given a
//! file path and a point in it, find the smallest-ranged piece of typed
//! output that covers that point and describe its type. Three sources feed
//! candidates — a function body's typed expression tree (via
//! [`simplec_types::TypedStatement::expression_at`]), a declaration's own
//! name range, and a `static if`'s condition — and
//! [`simplec_common::FileRange::span_size`] picks the narrowest.
//!
//! A `static if`'s condition has no typed sub-tree of its own: `TypeStaticIf`
//! jobs only retain whether the condition was true (§4.4 step 3), not a
//! typed expression. Rather than re-typing the condition, hover reports the
//! surfaced boolean directly, over the whole `static if` statement's range.

use simplec_common::FileRange;
use simplec_engine::{Engine, JobInput, JobKind, JobOutput};
use simplec_types::Type;

/// A resolved hover result: the source range it applies to, and a
/// human-readable type description.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverInfo {
    pub range: FileRange,
    pub description: String,
}

fn job_file_path<'a>(engine: &'a Engine, input: &JobInput) -> Option<&'a std::rc::Rc<str>> {
    match input {
        JobInput::Declaration(d) | JobInput::StaticIf(d) => Some(&engine.scope(d.scope).file_path),
        JobInput::FunctionBody(fb) => Some(&engine.scope(fb.body_scope).file_path),
        JobInput::PolymorphicInstantiation(_) | JobInput::ParseFile { .. } => None,
    }
}

/// Looks up the hover text for `(line, column)` in `path`, or `None` if
/// nothing typed there yet covers that point.
pub fn hover(engine: &Engine, path: &str, line: u32, column: u32) -> Option<HoverInfo> {
    let mut best: Option<HoverInfo> = None;
    let mut consider = |info: HoverInfo| {
        let better = match &best {
            None => true,
            Some(current) => info.range.span_size() < current.range.span_size(),
        };
        if better {
            best = Some(info);
        }
    };

    for job in &engine.jobs {
        let Some(file_path) = job_file_path(engine, &job.input) else { continue };
        if &**file_path != path {
            continue;
        }
        if !job.range.contains(line, column) {
            continue;
        }
        let Some(output) = job.output.as_ref() else { continue };

        match (job.kind, &job.input, output) {
            (JobKind::TypeStaticIf, _, JobOutput::StaticIf(info)) => {
                consider(HoverInfo {
                    range: job.range,
                    description: format!("{} (bool)", info.condition_true),
                });
            }
            (JobKind::TypeFunctionBody, JobInput::FunctionBody(_), JobOutput::FunctionBody(body)) => {
                for statement in &body.statements {
                    if !statement.range.contains(line, column) {
                        continue;
                    }
                    if let Some(expr) = statement.expression_at(line, column) {
                        let narrowest = expr.narrowest_at(line, column);
                        consider(HoverInfo {
                            range: narrowest.range,
                            description: describe(&narrowest.ty),
                        });
                    }
                }
            }
            // Only the generic declaration job names a type here — an
            // instantiation job's input is `PolymorphicInstantiation`, not
            // `Declaration`, and skipping it avoids picking one arbitrary
            // instantiation's type out of possibly many at the same name.
            (_, JobInput::Declaration(_), _) => {
                if let Some(ty) = output.declared_type() {
                    consider(HoverInfo { range: job.range, description: describe(ty) });
                }
            }
            _ => {}
        }
    }

    best
}

fn describe(ty: &Type) -> String {
    ty.describe()
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplec_common::FileRange;

    #[test]
    fn span_size_prefers_narrower_range() {
        let wide = FileRange::new(1, 1, 5, 1);
        let narrow = FileRange::new(2, 1, 2, 5);
        assert!(narrow.span_size() < wide.span_size());
    }

    #[test]
    fn boolean_description_matches_condition() {
        assert_eq!(format!("{} (bool)", true), "true (bool)");
        assert_eq!(format!("{} (bool)", false), "false (bool)");
    }
}
