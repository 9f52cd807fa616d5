use crate::ir::lowering::LoweringError;
use ariadne::{ColorGenerator, Label, Report, ReportKind};
use std::ops::Range;

#[derive(Debug, Clone)]
pub struct FileSpan {
    pub span: Range<usize>,
    pub path: String,
}

impl FileSpan {
    pub fn new(path: String, span: Range<usize>) -> Self {
        Self { path, span }
    }
}

impl ariadne::Span for FileSpan {
    type SourceId = String;

    fn source(&self) -> &Self::SourceId {
        &self.path
    }

    fn start(&self) -> usize {
        self.span.start
    }

    fn end(&self) -> usize {
        self.span.end
    }
}

/// Creates a report from a lowering error.
pub fn lowering_error_to_report(error: LoweringError) -> Report<'static, FileSpan> {
    let mut colors = ColorGenerator::new();
    colors.next();
    match error {
        LoweringError::UndefinedSymbol { span, name, path } => {
            let path = path.display().to_string();
            let filespan = FileSpan::new(path, span.into());
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("UndefinedSymbol")
                .with_label(
                    Label::new(filespan)
                        .with_message(format!("{name:?} is not declared in any enclosing scope."))
                        .with_color(colors.next()),
                )
                .with_message("Unresolved symbol reached lowering.")
                .finish()
        }
        LoweringError::NotAFunction { span, name, path } => {
            let path = path.display().to_string();
            let filespan = FileSpan::new(path, span.into());
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("NotAFunction")
                .with_label(
                    Label::new(filespan)
                        .with_message(format!("{name:?} is not a function."))
                        .with_color(colors.next()),
                )
                .finish()
        }
        LoweringError::NotAVariable { span, name, path } => {
            let path = path.display().to_string();
            let filespan = FileSpan::new(path, span.into());
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("NotAVariable")
                .with_label(
                    Label::new(filespan)
                        .with_message(format!("function {name:?} used as a value."))
                        .with_color(colors.next()),
                )
                .finish()
        }
        LoweringError::VoidValue { span, path } => {
            let path = path.display().to_string();
            let filespan = FileSpan::new(path, span.into());
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("VoidValue")
                .with_label(
                    Label::new(filespan)
                        .with_message("this expression has no value")
                        .with_color(colors.next()),
                )
                .finish()
        }
        LoweringError::UnresolvedType {
            span,
            name,
            ty,
            path,
        } => {
            let path = path.display().to_string();
            let filespan = FileSpan::new(path, span.into());
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("UnresolvedType")
                .with_label(
                    Label::new(filespan)
                        .with_message(format!("{name:?} has type {ty}, which has no storage."))
                        .with_color(colors.next()),
                )
                .finish()
        }
        LoweringError::CallParamCountMismatch {
            span,
            found,
            needs,
            path,
        } => {
            let path = path.display().to_string();
            let filespan = FileSpan::new(path, span.into());
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("CallParamCountMismatch")
                .with_label(
                    Label::new(filespan)
                        .with_message(format!(
                            "function call parameter count mismatch: found {}, needs {}.",
                            found, needs
                        ))
                        .with_color(colors.next()),
                )
                .finish()
        }
        LoweringError::ReturnOutsideFunction { span, path } => {
            let path = path.display().to_string();
            let filespan = FileSpan::new(path, span.into());
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("ReturnOutsideFunction")
                .with_label(
                    Label::new(filespan)
                        .with_message("return outside of a function body")
                        .with_color(colors.next()),
                )
                .finish()
        }
        LoweringError::LibraryCall {
            span,
            name,
            source,
            path,
        } => {
            let path = path.display().to_string();
            let filespan = FileSpan::new(path, span.into());
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("LibraryCall")
                .with_label(
                    Label::new(filespan)
                        .with_message(format!("{source}"))
                        .with_color(colors.next()),
                )
                .with_message(format!("Invalid call to builtin {name:?}."))
                .finish()
        }
        LoweringError::InternalError(message) => {
            let filespan = FileSpan::new(String::new(), 0..0);
            Report::build(ReportKind::Error, filespan)
                .with_code("InternalError")
                .with_message(message)
                .finish()
        }
    }
}
