//! Integration tests for template stamping
//! Covers the hook loop, context branches, directives and exception policies
//!
//! Templates are built with the document model's builder helpers, stamped
//! end to end and checked through run text and formatting.

use doc_model::{
    CommentBody, CommentId, Document, DocumentPart, NodeId, PartKind, Run, RunFormat,
};
use stamper::directive::{CommitScope, DirectiveHandler, HookScope};
use stamper::expression::{evaluate, parse};
use stamper::{
    collect_comments, default_accessors, ContextTree, DefaultingExceptionResolver,
    EvaluationError, FunctionRegistry, MethodSignature, PassingExceptionResolver, StampError,
    StampOptions, Stamper, StamperConfiguration, UnionContext, Value, ValueType,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A document with one main part and a body to append to
struct Template {
    document: Document,
}

impl Template {
    fn new() -> Self {
        init_tracing();
        Self {
            document: Document::new(),
        }
    }

    fn part(&mut self) -> &mut DocumentPart {
        self.document.main_mut()
    }

    fn body(&self) -> NodeId {
        self.document.main().root()
    }

    fn paragraph(&mut self, texts: &[&str]) -> NodeId {
        let body = self.body();
        self.part().append_text_paragraph(body, texts).unwrap()
    }

    /// Paragraph whose whole content is covered by a processor-wrapped comment
    fn commented_paragraph(&mut self, directive: &str, content: impl FnOnce(&mut DocumentPart, NodeId)) -> NodeId {
        let para = self.paragraph(&[]);
        let part = self.part();
        let (id, _) = part
            .append_comment_start(para, CommentBody::new("author", directive))
            .unwrap();
        content(&mut *part, para);
        part.close_comment(para, id).unwrap();
        para
    }

    fn stamp(&mut self, config: StamperConfiguration, root: Value) -> stamper::Result<stamper::StampReport> {
        Stamper::new(config).stamp(&mut self.document, root)
    }

    fn texts(&self) -> Vec<String> {
        self.document.main().paragraph_texts()
    }
}

fn bold() -> RunFormat {
    RunFormat::bold()
}

fn italic() -> RunFormat {
    RunFormat::italic()
}

fn run_texts(part: &DocumentPart, para: NodeId) -> Vec<String> {
    part.children(para)
        .iter()
        .filter_map(|&c| part.run(c))
        .map(|r| r.text.clone())
        .collect()
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn test_placeholder_in_single_formatted_run() {
    let mut template = Template::new();
    let para = template.paragraph(&[]);
    let part = template.part();
    part.append_run(para, Run::formatted("Hello, ", bold())).unwrap();
    part.append_placeholder(para, "${name}", Some(bold())).unwrap();
    part.append_run(para, Run::formatted("!", bold())).unwrap();

    let report = template
        .stamp(StamperConfiguration::standard(), Value::map([("name", "Bart")]))
        .unwrap();

    let part = template.document.main();
    assert_eq!(report.resolved(), 1);
    assert_eq!(part.text_of(para), "Hello, Bart!");
    assert_eq!(part.children(para).len(), 1);
    let run = part.run(part.children(para)[0]).unwrap();
    assert_eq!(run.format, Some(bold()));
}

#[test]
fn test_nested_comments_pair_by_identifier() {
    let mut template = Template::new();
    let para = template.paragraph(&[]);
    let part = template.part();
    let c1 = part.comments.insert(CommentBody::new("a", "displayParagraphIf(true)"));
    let c2 = part.comments.insert(CommentBody::new("a", "displayParagraphIf(true)"));
    let unrelated = part.comments.insert(CommentBody::new("a", "displayParagraphIf(true)"));
    part.append_bare_comment_start(para, c1).unwrap();
    part.append_bare_comment_start(para, unrelated).unwrap();
    part.append_bare_comment_start(para, c2).unwrap();
    part.append_run(para, Run::new("text")).unwrap();
    let c2_end = part.append_comment_end(para, c2).unwrap();
    let c1_end = part.append_comment_end(para, c1).unwrap();
    let unrelated_end = part.append_comment_end(para, unrelated).unwrap();

    let records = collect_comments(part).unwrap();
    assert_eq!(records[&c2].end, c2_end);
    assert_eq!(records[&c1].end, c1_end);
    assert_eq!(records[&unrelated].end, unrelated_end);
    assert_eq!(records[&c2].parent, Some(unrelated));

    let report = template.stamp(StamperConfiguration::standard(), Value::Null).unwrap();
    assert_eq!(report.resolved(), 3);
    let part = template.document.main();
    assert_eq!(run_texts(part, para), vec!["text"]);
    assert!(part.comments.is_empty());
}

#[test]
fn test_repeat_paragraph_per_item_in_order() {
    let mut template = Template::new();
    template.paragraph(&["start"]);
    template.commented_paragraph("repeatParagraph(people)", |part, para| {
        part.append_run(para, Run::new("Name: ")).unwrap();
        part.append_placeholder(para, "${name}", None).unwrap();
        part.append_run(para, Run::new(" of ")).unwrap();
        part.append_placeholder(para, "${family}", None).unwrap();
    });
    template.paragraph(&["end"]);

    let people: Vec<Value> = ["A", "B", "C"]
        .iter()
        .map(|n| Value::map([("name", *n)]))
        .collect();
    let root = Value::map([("people", Value::from(people)), ("family", Value::from("Simpson"))]);
    let report = template.stamp(StamperConfiguration::standard(), root).unwrap();

    assert_eq!(
        template.texts(),
        vec!["start", "Name: A of Simpson", "Name: B of Simpson", "Name: C of Simpson", "end"]
    );
    let main = report.part(PartKind::Main).unwrap();
    assert_eq!(main.branches, 4);
    assert_eq!(main.resolved, 7);
    assert!(template.document.main().comments.is_empty());
}

#[test]
fn test_placeholder_over_several_runs_leaves_no_empty_run() {
    let mut template = Template::new();
    let para = template.paragraph(&[]);
    let part = template.part();
    part.append_run(para, Run::formatted("Hel", bold())).unwrap();
    part.append_run(para, Run::formatted("lo, ", italic())).unwrap();
    part.append_marker(
        para,
        doc_model::Marker::placeholder(),
        vec![Run::formatted("${na", bold()), Run::formatted("me}", italic())],
    )
    .unwrap();

    let config = StamperConfiguration::standard()
        .with_options(StampOptions::default().with_merge_similar_runs(false))
        .unwrap();
    template.stamp(config, Value::map([("name", "Bart")])).unwrap();

    let part = template.document.main();
    assert_eq!(run_texts(part, para), vec!["Hel", "lo, ", "Bart"]);
    assert_eq!(part.children(para).len(), 3);
    let bart = part.run(part.children(para)[2]).unwrap();
    assert_eq!(bart.format, Some(bold()));
}

#[test]
fn test_failed_expression_with_empty_substitute() {
    let mut template = Template::new();
    let para = template.paragraph(&["a"]);
    let part = template.part();
    let marker = part.append_placeholder(para, "${person.name}", None).unwrap();
    part.append_run(para, Run::new("b")).unwrap();

    let config = StamperConfiguration::standard()
        .with_exception_resolver(DefaultingExceptionResolver::new(""));
    let report = template.stamp(config, Value::map([("other", 1)])).unwrap();

    let part = template.document.main();
    assert_eq!(report.failed(), 1);
    assert!(!part.contains(marker));
    assert_eq!(part.text_of(para), "ab");
}

// =============================================================================
// Context branches
// =============================================================================

#[test]
fn test_inner_scope_shadows_outer() {
    let mut template = Template::new();
    template.commented_paragraph("repeatParagraph(items)", |part, para| {
        part.append_placeholder(para, "${x}", None).unwrap();
        part.append_run(para, Run::new("/")).unwrap();
        part.append_placeholder(para, "${#root.x}", None).unwrap();
    });
    let root = Value::map([
        ("x", Value::from("outer")),
        ("items", Value::from(vec![Value::map([("x", "inner")])])),
    ]);
    template.stamp(StamperConfiguration::standard(), root).unwrap();
    assert_eq!(template.texts(), vec!["inner/outer"]);
}

#[test]
fn test_branches_resolve_independently() {
    let accessors = default_accessors();
    let functions = FunctionRegistry::new();
    let mut tree = ContextTree::new(Value::map([("shared", 0)]));
    let first = tree.add_branch(Value::map([("n", 1)]));
    let second = tree.add_branch(Value::map([("n", 2)]));
    assert_ne!(first, second);

    let eval = |tree: &ContextTree, key: &str, text: &str| {
        let branch = tree.find(key).unwrap().clone();
        let mut ctx = UnionContext::new(branch, &accessors, Vec::new(), &[], &functions);
        evaluate(&parse(text).unwrap(), &mut ctx)
    };

    // a value read out of one branch is a copy
    let mut read = eval(&tree, &first, "#this").unwrap();
    if let Value::Map(entries) = &mut read {
        entries.insert("n".into(), Value::from(99));
    }
    eval(&tree, &first, "n = n + 10").unwrap();

    assert_eq!(eval(&tree, &first, "n").unwrap(), Value::from(11));
    assert_eq!(eval(&tree, &second, "n").unwrap(), Value::from(2));
}

#[test]
fn test_assignment_visible_to_later_hooks() {
    let mut template = Template::new();
    let para = template.paragraph(&[]);
    let part = template.part();
    part.append_inline_processor(para, "#{greeting = 'Hi'}").unwrap();
    part.append_placeholder(para, "${greeting}", None).unwrap();

    template
        .stamp(StamperConfiguration::standard(), Value::map([("other", 1)]))
        .unwrap();
    assert_eq!(template.document.main().text_of(para), "Hi");
}

// =============================================================================
// Hook loop
// =============================================================================

#[test]
fn test_hook_after_inserted_content_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let config = StamperConfiguration::standard().with_function("tick", Vec::<ValueType>::new(), move |_| {
        Ok(Value::from(counter.fetch_add(1, Ordering::SeqCst) + 1))
    });

    let mut template = Template::new();
    template.commented_paragraph("repeatParagraph(items)", |part, para| {
        part.append_run(para, Run::new("row")).unwrap();
    });
    let last = template.paragraph(&[]);
    template.part().append_placeholder(last, "${tick()}", None).unwrap();

    template
        .stamp(config, Value::map([("items", vec![1, 2, 3])]))
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(template.texts(), vec!["row", "row", "row", "1"]);
}

#[test]
fn test_malformed_comment_aborts_pass() {
    let mut template = Template::new();
    let para = template.paragraph(&["x"]);
    template.part().append_comment_end(para, CommentId(4)).unwrap();
    assert!(matches!(
        template.stamp(StamperConfiguration::standard(), Value::Null),
        Err(StampError::MalformedDocument(_))
    ));
}

// =============================================================================
// Exception policies
// =============================================================================

#[test]
fn test_passing_policy_leaves_placeholder_text() {
    let mut template = Template::new();
    let para = template.paragraph(&["Dear "]);
    let part = template.part();
    part.append_placeholder(para, "${missing}", None).unwrap();
    let processor = part.append_inline_processor(para, "#{nothing()}").unwrap();

    let config = StamperConfiguration::standard().with_exception_resolver(PassingExceptionResolver);
    let report = template.stamp(config, Value::map([("name", "x")])).unwrap();

    let part = template.document.main();
    assert_eq!(report.failed(), 2);
    assert_eq!(part.text_of(para), "Dear ${missing}#{nothing()}");
    assert!(part.contains(processor));
}

#[test]
fn test_throwing_policy_escalates() {
    let mut template = Template::new();
    let para = template.paragraph(&[]);
    template.part().append_placeholder(para, "${missing}", None).unwrap();
    let result = template.stamp(StamperConfiguration::standard(), Value::map([("a", 1)]));
    assert!(matches!(
        result,
        Err(StampError::Unresolved { expression, .. }) if expression == "${missing}"
    ));
}

#[test]
fn test_fractional_index_goes_through_policy() {
    let mut template = Template::new();
    let para = template.paragraph(&[]);
    let part = template.part();
    part.append_placeholder(para, "${items[1]}", None).unwrap();
    part.append_run(para, Run::new("|")).unwrap();
    part.append_placeholder(para, "${items[1.5]}", None).unwrap();
    part.append_run(para, Run::new("|")).unwrap();
    part.append_placeholder(para, "${items.get(0.5)}", None).unwrap();

    let config = StamperConfiguration::standard()
        .with_exception_resolver(DefaultingExceptionResolver::new("?"));
    let root = Value::map([("items", Value::from(vec!["a", "b"]))]);
    let report = template.stamp(config, root).unwrap();

    assert_eq!(report.resolved(), 1);
    assert_eq!(report.failed(), 2);
    assert_eq!(template.document.main().text_of(para), "b|?|?");
}

#[test]
fn test_directive_argument_error_is_evaluation_failure() {
    let mut template = Template::new();
    template.commented_paragraph("repeatTableRow(items)", |part, para| {
        part.append_run(para, Run::new("not in a table")).unwrap();
    });
    let config = StamperConfiguration::standard()
        .with_exception_resolver(DefaultingExceptionResolver::new(""));
    let report = template
        .stamp(config, Value::map([("items", vec![1])]))
        .unwrap();
    assert_eq!(report.failed(), 1);
    assert_eq!(template.texts(), vec!["not in a table"]);
    assert_eq!(template.document.main().comments.len(), 1);
}

// =============================================================================
// Directives
// =============================================================================

#[test]
fn test_repeat_table_row() {
    let mut template = Template::new();
    let body = template.body();
    let part = template.part();
    let (_, rows) = part.append_table(body, 2, 2).unwrap();
    let header = part.cell_paragraph(rows[0], 0).unwrap();
    part.append_run(header, Run::new("Name")).unwrap();
    let name_cell = part.cell_paragraph(rows[1], 0).unwrap();
    let (id, _) = part
        .append_comment_start(name_cell, CommentBody::new("a", "repeatTableRow(people)"))
        .unwrap();
    part.append_placeholder(name_cell, "${name}", None).unwrap();
    part.close_comment(name_cell, id).unwrap();
    let age_cell = part.cell_paragraph(rows[1], 1).unwrap();
    part.append_placeholder(age_cell, "${age}", None).unwrap();

    let people = vec![
        Value::map([("name", Value::from("Homer")), ("age", Value::from(39))]),
        Value::map([("name", Value::from("Marge")), ("age", Value::from(36))]),
    ];
    template
        .stamp(StamperConfiguration::standard(), Value::map([("people", people)]))
        .unwrap();

    assert_eq!(
        template.texts(),
        vec!["Name", "", "Homer", "39", "Marge", "36"]
    );
}

#[test]
fn test_display_directives() {
    let mut template = Template::new();
    template.commented_paragraph("displayParagraphIf(show)", |part, para| {
        part.append_run(para, Run::new("hidden")).unwrap();
    });
    template.commented_paragraph("displayParagraphIfPresent(nickname)", |part, para| {
        part.append_run(para, Run::new("no nickname")).unwrap();
    });
    template.commented_paragraph("displayParagraphIfAbsent(nickname)", |part, para| {
        part.append_run(para, Run::new("absent")).unwrap();
    });
    let para = template.paragraph(&["kept "]);
    template
        .part()
        .append_inline_processor(para, "#{displayParagraphIf(!show)}")
        .unwrap();

    let root = Value::map([("show", Value::from(false)), ("nickname", Value::Null)]);
    template.stamp(StamperConfiguration::standard(), root).unwrap();
    assert_eq!(template.texts(), vec!["absent", "kept "]);
}

#[test]
fn test_display_table_if() {
    let mut template = Template::new();
    let body = template.body();
    let part = template.part();
    let (table, rows) = part.append_table(body, 1, 1).unwrap();
    let cell = part.cell_paragraph(rows[0], 0).unwrap();
    part.append_inline_processor(cell, "#{displayTableIf(false)}").unwrap();
    template.paragraph(&["after"]);

    template.stamp(StamperConfiguration::standard(), Value::Null).unwrap();
    assert!(!template.document.main().contains(table));
    assert_eq!(template.texts(), vec!["after"]);
}

#[test]
fn test_replace_word_with() {
    let mut template = Template::new();
    let para = template.paragraph(&["Hello "]);
    let part = template.part();
    let (id, _) = part
        .append_comment_start(para, CommentBody::new("a", "replaceWordWith(name)"))
        .unwrap();
    part.append_run(para, Run::formatted("World", italic())).unwrap();
    part.close_comment(para, id).unwrap();
    part.append_run(para, Run::new("!")).unwrap();

    template
        .stamp(StamperConfiguration::standard(), Value::map([("name", "Bart")]))
        .unwrap();

    let part = template.document.main();
    assert_eq!(part.text_of(para), "Hello Bart!");
    let bart = part
        .children(para)
        .iter()
        .filter_map(|&c| part.run(c))
        .find(|r| r.text == "Bart")
        .unwrap();
    assert_eq!(bart.format, Some(italic()));
}

/// Appends a check mark to its paragraph on commit
#[derive(Debug)]
struct CheckDirective {
    paragraph: Option<NodeId>,
    checked: bool,
}

impl DirectiveHandler for CheckDirective {
    fn methods(&self) -> Vec<MethodSignature> {
        vec![MethodSignature::new("check", vec![ValueType::Boolean])]
    }

    fn invoke(&mut self, _name: &str, args: &[Value]) -> Result<Value, EvaluationError> {
        self.checked = args[0].is_truthy();
        Ok(Value::Null)
    }

    fn commit(&mut self, part: &mut DocumentPart, _scope: &mut CommitScope<'_>) -> stamper::Result<()> {
        if let (true, Some(para)) = (self.checked, self.paragraph) {
            part.append_run(para, Run::new("[x]"))?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.checked = false;
    }
}

#[test]
fn test_custom_directive_registration() {
    let config = StamperConfiguration::new().with_directive("check", |scope: &HookScope| {
        Box::new(CheckDirective {
            paragraph: scope.paragraph,
            checked: false,
        }) as Box<dyn DirectiveHandler>
    });

    let mut template = Template::new();
    template.commented_paragraph("check(done)", |part, para| {
        part.append_run(para, Run::new("task ")).unwrap();
    });
    template
        .stamp(config, Value::map([("done", true)]))
        .unwrap();
    assert_eq!(template.texts(), vec!["task [x]"]);
}

// =============================================================================
// Parts
// =============================================================================

#[test]
fn test_every_part_gets_fresh_tree() {
    let mut template = Template::new();
    template.commented_paragraph("repeatParagraph(items)", |part, para| {
        part.append_placeholder(para, "${#this}", None).unwrap();
    });

    let mut header = DocumentPart::new(PartKind::Header(1));
    let para = header.append_paragraph(header.root()).unwrap();
    header.append_placeholder(para, "${title}", None).unwrap();
    template.document.add_part(header);

    let root = Value::map([("items", Value::from(vec!["a", "b"])), ("title", Value::from("Report"))]);
    let report = template.stamp(StamperConfiguration::standard(), root).unwrap();

    assert_eq!(report.parts.len(), 2);
    assert_eq!(report.part(PartKind::Main).unwrap().branches, 3);
    assert_eq!(report.part(PartKind::Header(1)).unwrap().branches, 1);
    let header = template.document.part(PartKind::Header(1)).unwrap();
    assert_eq!(header.paragraph_texts(), vec!["Report"]);
    assert_eq!(template.texts(), vec!["a", "b"]);
}
