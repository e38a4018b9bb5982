use assert_cmd::Command;
use mockito::{Matcher, Mock, Server, ServerGuard};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn load_fixture(file_name: &str) -> String {
    let mut path = Path::new(env!("CARGO_MANIFEST_DIR")).to_path_buf();
    path.push("tests");
    path.push("fixtures");
    path.push(file_name);
    fs::read_to_string(&path).expect(&format!("Failed to read {}", file_name))
}

const PAPER_TEX: &str = r"\documentclass[prl]{revtex4-1}
\begin{document}
Observed~\cite{2016PhRvL.116f1102A,Abbott:2016blz}, announced in~\cite{2016arXiv160203837T}.
\nocite{2016arXiv160203837T,Maldacena:1997re}
\bibliography{paperNotes,refs}
\end{document}
";

const PREPRINT_SEARCH: &str = r#"{"hits": {"total": 1, "hits": [{"metadata": {
    "titles": [{"title": "A preprint"}],
    "authors": [{"full_name": "Doe, J."}],
    "arxiv_eprints": [{"value": "2001.00001", "categories": ["hep-th"]}],
    "preprint_date": "2020-01-03"
}}]}}"#;

/// Writes paper.tex with its aux files into a scratch directory.
fn compiled_document(dir: &Path) {
    fs::write(dir.join("paper.tex"), PAPER_TEX).unwrap();
    fs::write(dir.join("paper.aux"), load_fixture("paper.aux")).unwrap();
    fs::write(dir.join("chapter.aux"), load_fixture("chapter.aux")).unwrap();
}

/// Serves ADS export pages for both Abbott bibcodes and the INSPIRE search for every texkey.
fn record_server() -> (ServerGuard, Vec<Mock>) {
    let mut server = Server::new();
    let export_page = load_fixture("ads_export.html");
    let mut mocks = Vec::new();
    for key in ["2016PhRvL.116f1102A", "2016arXiv160203837T"] {
        mocks.push(
            server
                .mock("GET", format!("/abs/{}/exportcitation", key).as_str())
                .with_status(200)
                .with_body(&export_page)
                .create(),
        );
    }
    mocks.push(
        server
            .mock("GET", "/abs/1998AJ....116.1009R/exportcitation")
            .with_status(404)
            .create(),
    );
    mocks.push(
        server
            .mock("GET", "/api/literature")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(load_fixture("inspire_search.json"))
            .create(),
    );
    (server, mocks)
}

fn fillbib(server: &ServerGuard) -> Command {
    let mut cmd = Command::cargo_bin("fillbib").unwrap();
    cmd.env("ADS_BASE_URL", server.url())
        .env("INSPIRE_BASE_URL", server.url())
        .env("NO_PROXY", "127.0.0.1,localhost");
    cmd
}

#[test]
fn test_cli_requires_subcommand() {
    let mut cmd = Command::cargo_bin("fillbib").unwrap();
    cmd.assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_missing_aux_file() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("fillbib").unwrap();
    cmd.arg("process").arg(dir.path().join("paper.tex"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("paper.aux"));
}

#[test]
fn test_cli_missing_bibdata() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("draft.aux"), "\\relax\n\\citation{Witten:1998qj}\n").unwrap();
    let mut cmd = Command::cargo_bin("fillbib").unwrap();
    cmd.arg("process").arg(dir.path().join("draft"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No bibliography file declared"));
}

#[test]
fn test_cli_resolve_prints_record() {
    let mut server = Server::new();
    let page = server
        .mock("GET", "/abs/2016PhRvL.116f1102A/exportcitation")
        .with_status(200)
        .with_body(load_fixture("ads_export.html"))
        .create();

    let mut cmd = Command::cargo_bin("fillbib").unwrap();
    cmd.env("ADS_BASE_URL", server.url())
        .env("NO_PROXY", "127.0.0.1,localhost")
        .arg("resolve")
        .arg("2016PhRvL.116f1102A");
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("@ARTICLE{2016PhRvL.116f1102A,"))
        .stdout(predicate::str::contains("journal = {\\prl}"));
    page.assert();
}

#[test]
fn test_cli_resolve_nothing_found() {
    let mut server = Server::new();
    let _search = server
        .mock("GET", "/api/literature")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"hits": {"total": 0, "hits": []}}"#)
        .create();

    let mut cmd = Command::cargo_bin("fillbib").unwrap();
    cmd.env("INSPIRE_BASE_URL", server.url())
        .env("NO_PROXY", "127.0.0.1,localhost")
        .args(["resolve", "Nobody:2020xx"]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("INSPIRE not found: Nobody:2020xx"));
}

#[test]
fn test_cli_process_with_all_switches() {
    let dir = tempdir().unwrap();
    compiled_document(dir.path());
    let (server, _mocks) = record_server();

    let mut cmd = fillbib(&server);
    cmd.arg("process")
        .arg(dir.path().join("paper.tex"))
        .arg("-j")
        .arg("-r")
        .arg("--bib")
        .arg(dir.path().join("library"))
        .args(["--generate", "--max-authors", "3", "--arxiv-journal"]);
    cmd.assert().success();

    assert!(!dir.path().join("refs.bib").exists());
    let bib = fs::read_to_string(dir.path().join("library.bib")).unwrap();
    assert!(bib.contains("@ARTICLE{2016PhRvL.116f1102A,"));
    assert!(bib.contains("@article{Abbott:2016blz,"));
    assert!(bib.contains("@article{Maldacena:1997re,"));
    assert!(!bib.contains("2016arXiv160203837T"));
    assert!(bib.contains("journal = {Phys. Rev. Lett.}"));
    assert!(bib.contains("journal = \"Phys. Rev. Lett.\""));
    assert!(!bib.contains("Phys.Rev.Lett."));
    assert!(!bib.contains("eprint"));
    assert!(bib.contains("author = \"Abbott, B.P. and Abbott, R. and Abbott, T.D. and others\","));

    let document = fs::read_to_string(dir.path().join("paper.tex")).unwrap();
    assert!(!document.contains("2016arXiv160203837T"));
    assert_eq!(document.matches("2016PhRvL.116f1102A").count(), 3);
}

#[test]
fn test_cli_process_switches_turned_back_off() {
    let dir = tempdir().unwrap();
    compiled_document(dir.path());
    let (server, _mocks) = record_server();

    let mut cmd = fillbib(&server);
    cmd.arg("process")
        .arg(dir.path().join("paper"))
        .args(["-j", "--no-canonicalize-journals", "-r", "--no-replace-preprints"]);
    cmd.assert().success();

    let bib = fs::read_to_string(dir.path().join("refs.bib")).unwrap();
    assert!(bib.contains("@ARTICLE{2016arXiv160203837T,"));
    assert!(bib.contains("journal = {\\prl}"));
    assert!(bib.contains("eprint = {1602.03837}"));
    assert_eq!(fs::read_to_string(dir.path().join("paper.tex")).unwrap(), PAPER_TEX);
}

#[test]
fn test_cli_resolve_generate_flags() {
    let mut server = Server::new();
    let _abbott = server
        .mock("GET", "/api/literature")
        .match_query(Matcher::UrlEncoded("q".into(), "texkeys:\"Abbott:2016blz\"".into()))
        .with_status(200)
        .with_body(load_fixture("inspire_search.json"))
        .create();
    let _doe = server
        .mock("GET", "/api/literature")
        .match_query(Matcher::UrlEncoded("q".into(), "texkeys:\"Doe:2020abc\"".into()))
        .with_status(200)
        .with_body(PREPRINT_SEARCH)
        .create();

    let mut cmd = fillbib(&server);
    cmd.args([
        "resolve",
        "Abbott:2016blz",
        "Doe:2020abc",
        "--generate",
        "--max-authors",
        "5",
        "--shown-authors",
        "2",
        "--arxiv-journal",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("@article{Abbott:2016blz,"))
        .stdout(predicate::str::contains(
            "    author = \"Abbott, B.P. and Abbott, R. and others\",",
        ))
        .stdout(predicate::str::contains("journal = \"Phys.Rev.Lett.\""))
        .stdout(predicate::str::contains("@article{Doe:2020abc,"))
        .stdout(predicate::str::contains("journal = \"arXiv:2001.00001\""))
        .stdout(predicate::str::contains("month = \"1\""));
}
