use pretty_assertions::assert_eq;
use proptest::prelude::*;
use repofix::document::classifier::ExtensionPolicy;
use repofix::TreeSerializer;
use tempfile::TempDir;

mod common;
use common::test_helpers::*;

fn serializer() -> TreeSerializer {
    TreeSerializer::new(ExtensionPolicy::default(), 64)
}

/// File paths named by each rendering, in order
fn markdown_paths(markdown: &str) -> Vec<String> {
    markdown
        .lines()
        .filter(|l| l.starts_with('`') && l.ends_with('`') && !l.starts_with("```"))
        .map(|l| l.trim_matches('`').to_string())
        .collect()
}

fn plain_paths(plain: &str) -> Vec<String> {
    plain
        .lines()
        .filter_map(|l| l.strip_prefix("File Path: "))
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_mixed_tree_scenario() {
    setup_test_logger();
    let temp = TempDir::new().unwrap();
    write_tree(
        temp.path(),
        &[("a.js", b"x\ny"), ("img.png", b"\x89PNG"), ("sub/b.py", b"z")],
    );

    let doc = serializer().serialize(temp.path()).await.unwrap();

    assert_eq!(
        doc.markdown,
        "# Repository Code\n\n\
         `a.js`\n\n```javascript\nxy\n```\n\n\
         ## sub\n\n\
         `sub/b.py`\n\n```python\nz\n```\n\n"
    );
    assert_eq!(doc.files, vec!["a.js".to_string(), "sub/b.py".to_string()]);
    assert!(!doc.markdown.contains("img.png"));
    assert!(!doc.plain.contains("img.png"));
}

#[tokio::test]
async fn test_non_code_directory_is_not_mentioned() {
    let temp = TempDir::new().unwrap();
    write_tree(
        temp.path(),
        &[
            ("index.ts", b"export {}"),
            ("assets/logo.png", b"png"),
            ("docs/guide.md", b"# Guide"),
            ("docs/api/ref.js", b"hidden"),
        ],
    );

    let doc = serializer().serialize(temp.path()).await.unwrap();
    assert_eq!(doc.files, vec!["index.ts".to_string()]);
    assert!(!doc.markdown.contains("## assets"));
    assert!(!doc.markdown.contains("## docs"));
    assert!(!doc.plain.contains("ref.js"));
}

#[tokio::test]
async fn test_excluded_names_are_skipped() {
    let temp = TempDir::new().unwrap();
    write_tree(
        temp.path(),
        &[
            (".gitignore", b"target"),
            ("package-lock.json", b"{}"),
            ("README.md", b"# Readme"),
            ("run.sh", b"echo hi"),
        ],
    );

    let doc = serializer().serialize(temp.path()).await.unwrap();
    assert_eq!(doc.files, vec!["run.sh".to_string()]);
    assert!(doc.markdown.contains("```bash\necho hi\n```"));
}

#[tokio::test]
async fn test_serialization_is_idempotent() {
    let temp = TempDir::new().unwrap();
    write_tree(
        temp.path(),
        &[
            ("b.js", b"2"),
            ("a.js", b"1"),
            ("lib/z.py", b"3"),
            ("lib/inner/y.css", b"4"),
        ],
    );

    let first = serializer().serialize(temp.path()).await.unwrap();
    let second = serializer().serialize(temp.path()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.files,
        vec!["a.js", "b.js", "lib/inner/y.css", "lib/z.py"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
}

fn tree_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    let dir = prop::sample::select(vec!["", "src/", "src/util/", "web/", "assets/"]);
    let name = "[a-d]{1,3}";
    let ext = prop::sample::select(vec!["js", "py", "png", "md", "json", "txt", "sh"]);
    let content = "[a-z \n]{0,12}";
    prop::collection::vec(
        (dir, name, ext, content).prop_map(|(d, n, e, c)| (format!("{}{}.{}", d, n, e), c)),
        1..12,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn renderings_list_the_same_files(files in tree_strategy()) {
        let temp = TempDir::new().unwrap();
        for (path, content) in &files {
            write_tree(temp.path(), &[(path.as_str(), content.as_bytes())]);
        }

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let doc = runtime.block_on(serializer().serialize(temp.path())).unwrap();

        prop_assert_eq!(markdown_paths(&doc.markdown), doc.files.clone());
        prop_assert_eq!(plain_paths(&doc.plain), doc.files.clone());
        for path in &doc.files {
            prop_assert!(!path.ends_with(".png") && !path.ends_with(".md") && !path.ends_with(".json"));
        }
    }
}
