use iitc_deploy_core::index::{
    build_index_documents, variant_title, DirectoryIndex, IndexDocument, IndexError,
    DEFAULT_SITE_TITLE,
};
use iitc_deploy_core::meta::ScriptMeta;
use iitc_deploy_core::tree::{NodeSeed, PathTree};

fn add_plugin(tree: &mut PathTree, dir: &str, script_id: &str, meta_text: &str) {
    tree.insert(&format!("{dir}/{script_id}.user.js"), NodeSeed::Script)
        .unwrap();
    tree.insert(
        &format!("{dir}/{script_id}.meta.js"),
        NodeSeed::ScriptMeta(ScriptMeta::parse(meta_text)),
    )
    .unwrap();
}

fn directory_page<'a>(documents: &'a [IndexDocument], filename: &str) -> &'a DirectoryIndex {
    documents
        .iter()
        .find_map(|doc| match doc {
            IndexDocument::Directory(dir) if dir.filename() == filename => Some(dir),
            _ => None,
        })
        .expect("directory page present")
}

#[test]
fn plugin_round_trip_renders_category_link() {
    let mut tree = PathTree::new();
    add_plugin(
        &mut tree,
        "local/plugins",
        "foo",
        "// @id foo@x\n// @name Foo Plugin\n// @category Tools\n",
    );

    let documents = build_index_documents(&tree, DEFAULT_SITE_TITLE).unwrap();
    let local = documents
        .iter()
        .find(|d| d.filename() == "local.html")
        .expect("local.html generated");
    let html = local.render();

    assert!(html.contains(r#"<h3 class="ui-bar ui-bar-a ui-corner-all">Tools</h3>"#));
    assert!(html.contains(
        r#"<li><a href="local/plugins/foo.user.js" data-ajax="false">Foo Plugin</a></li>"#
    ));
    assert_eq!(local.title(), "Desktop");
}

#[test]
fn missing_category_groups_under_none() {
    let mut tree = PathTree::new();
    add_plugin(&mut tree, "local/plugins", "bar", "// @id bar@x\n// @name Bar\n");

    let documents = build_index_documents(&tree, DEFAULT_SITE_TITLE).unwrap();
    let local = directory_page(&documents, "local.html");
    let section = local.categories.get("None").expect("None category");
    assert!(section.plugins.contains_key("bar"));
}

#[test]
fn deleted_category_is_grouped_but_not_rendered() {
    let mut tree = PathTree::new();
    add_plugin(
        &mut tree,
        "local/plugins",
        "old",
        "// @id old@x\n// @name Old Plugin\n// @category DELETED\n",
    );
    add_plugin(
        &mut tree,
        "local/plugins",
        "keep",
        "// @id keep@x\n// @name Kept Plugin\n// @category Misc\n",
    );

    let documents = build_index_documents(&tree, DEFAULT_SITE_TITLE).unwrap();
    let local = directory_page(&documents, "local.html");
    let deleted = local.categories.get("DELETED").expect("deleted grouped");
    assert!(deleted.is_hidden());
    assert!(deleted.plugins.contains_key("old"));

    let html = IndexDocument::Directory(local.clone()).render();
    assert!(!html.contains("Old Plugin"));
    assert!(!html.contains("DELETED"));
    assert!(html.contains("Kept Plugin"));
}

#[test]
fn main_index_links_each_variant_in_order() {
    let mut tree = PathTree::new();
    add_plugin(&mut tree, "mobile/plugins", "a", "// @name A\n");
    add_plugin(&mut tree, "local/plugins", "a", "// @name A\n");

    let documents = build_index_documents(&tree, "My Build").unwrap();
    assert_eq!(documents.len(), 3);
    let main = documents.last().unwrap();
    assert!(matches!(main, IndexDocument::Main(_)));
    assert_eq!(main.filename(), "index.html");

    let html = main.render();
    let mobile = html
        .find(r#"<li><a href="mobile.html">Mobile</a></li>"#)
        .expect("mobile link");
    let local = html
        .find(r#"<li><a href="local.html">Desktop</a></li>"#)
        .expect("local link");
    assert!(mobile < local);
    assert_eq!(html.matches("<li>").count(), 2);
    assert!(html.contains("<title>My Build</title>"));
    assert!(!html.contains("data-add-back-btn"));
}

#[test]
fn mobile_page_links_the_archive_first() {
    let mut tree = PathTree::new();
    add_plugin(&mut tree, "mobile/plugins", "a", "// @name A\n// @category Misc\n");

    let documents = build_index_documents(&tree, DEFAULT_SITE_TITLE).unwrap();
    let html = documents
        .iter()
        .find(|d| d.filename() == "mobile.html")
        .unwrap()
        .render();

    let archive = html
        .find(r#"<a href="mobile/mobile.zip" data-ajax="false">mobile.zip</a>"#)
        .expect("archive link");
    let category = html.find(">Misc</h3>").expect("category heading");
    assert!(archive < category);
    assert!(html.contains("Mobile Zip File"));
}

#[test]
fn main_script_is_rendered_before_categories() {
    let mut tree = PathTree::new();
    add_plugin(
        &mut tree,
        "local",
        "total-conversion-build",
        "// @id ingress-intel-total-conversion@jonatkins\n// @name IITC: total conversion\n",
    );
    add_plugin(&mut tree, "local/plugins", "a", "// @name A\n// @category Alpha\n");

    let documents = build_index_documents(&tree, DEFAULT_SITE_TITLE).unwrap();
    let local = directory_page(&documents, "local.html");
    let main = local.main_script.as_ref().expect("main script");
    assert!(main.is_root());
    assert_eq!(main.url, "local/total-conversion-build.user.js");

    let html = IndexDocument::Directory(local.clone()).render();
    let main_heading = html.find(">IITC Main Script</h3>").expect("main heading");
    let category = html.find(">Alpha</h3>").expect("category heading");
    assert!(main_heading < category);
    assert!(html.contains(">IITC: total conversion</a>"));
}

#[test]
fn root_plugin_is_elevated_out_of_categories() {
    let mut tree = PathTree::new();
    add_plugin(
        &mut tree,
        "local/plugins",
        "core",
        "// @id ingress-intel-total-conversion@jonatkins\n// @name Core\n// @category Main\n",
    );

    let documents = build_index_documents(&tree, DEFAULT_SITE_TITLE).unwrap();
    let local = directory_page(&documents, "local.html");
    assert_eq!(local.main_script.as_ref().unwrap().script_id, "core");
    assert!(local.categories.is_empty());
}

#[test]
fn script_without_metadata_fails_the_page() {
    let mut tree = PathTree::new();
    tree.insert("local/plugins/lonely.user.js", NodeSeed::Script)
        .unwrap();

    let err = build_index_documents(&tree, DEFAULT_SITE_TITLE).unwrap_err();
    match err {
        IndexError::MissingMeta { dir, script_id } => {
            assert_eq!(dir, "local/plugins");
            assert_eq!(script_id, "lonely");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn metadata_without_script_is_not_listed() {
    let mut tree = PathTree::new();
    tree.insert(
        "local/plugins/ghost.meta.js",
        NodeSeed::ScriptMeta(ScriptMeta::parse("// @name Ghost\n")),
    )
    .unwrap();

    let documents = build_index_documents(&tree, DEFAULT_SITE_TITLE).unwrap();
    let local = directory_page(&documents, "local.html");
    assert!(local.categories.is_empty());
    assert!(!documents[0].render().contains("Ghost"));
}

#[test]
fn variant_without_plugins_directory_fails() {
    let mut tree = PathTree::new();
    tree.insert("local/readme.txt", NodeSeed::File).unwrap();

    let err = build_index_documents(&tree, DEFAULT_SITE_TITLE).unwrap_err();
    assert!(matches!(err, IndexError::MissingPlugins { variant } if variant == "local"));
}

#[test]
fn document_skeleton_is_complete() {
    let mut tree = PathTree::new();
    add_plugin(&mut tree, "local/plugins", "a", "// @name A\n");

    let documents = build_index_documents(&tree, DEFAULT_SITE_TITLE).unwrap();
    let html = documents[0].render();
    let lines: Vec<&str> = html.lines().collect();

    assert_eq!(lines[0], "<!DOCTYPE html>");
    assert_eq!(lines[1], "<html>");
    assert_eq!(lines[2], "<head>");
    assert_eq!(lines[3], "\t<title>Desktop</title>");
    assert!(lines[4].starts_with("\t<meta name=\"viewport\""));
    assert!(lines[5].contains("jquery.mobile-1.4.4.min.css"));
    assert_eq!(lines[6], "</head>");
    assert_eq!(lines[7], "<body>");
    assert_eq!(lines[8], "\t<div data-role=\"page\">");
    assert_eq!(lines[9], "\t\t<div data-role=\"header\" data-add-back-btn=\"true\">");
    assert_eq!(lines[10], "\t\t\t<h1>Desktop</h1>");
    assert_eq!(*lines.last().unwrap(), "</html>");
    assert!(html.contains("\t<script src=\"http://code.jquery.com/jquery-1.11.1.min.js\"></script>"));
}

#[test]
fn titles_capitalise_each_word() {
    assert_eq!(variant_title("local"), "Desktop");
    assert_eq!(variant_title("mobile"), "Mobile");
    assert_eq!(variant_title("release-candidate"), "Release-Candidate");
    assert_eq!(variant_title("TEST build"), "Test Build");
}
