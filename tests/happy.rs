use chrono::{SecondsFormat, Utc};
use homepage::activity::FALLBACK_ACTIVITY;
use homepage::tech_stack::fallback_tech_stack;
use homepage::ProfileAssembler;
use homepage_app::args::Args;
use homepage_app::config::Config;
use homepage_app::server::{router, AppState};
use homepage_app::{build_assembler, export};
use github_client::GithubClient;
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN: &str = "octocat";
const PUSHES_NOW: usize = 6;

fn args(server: &MockServer, root: &Path) -> Args {
    Args {
        config: root.join("config.json"),
        token_file: root.join("github_token.txt"),
        api_url: server.uri(),
        raw_url: server.uri(),
        insecure: false,
        timeout: 5,
        command: None,
    }
}

fn config() -> Config {
    Config {
        profile_url: format!("https://github.com/{}", LOGIN),
        name: "Configured".to_string(),
        bio: "Maths and Python".to_string(),
        github_token: "config-token".to_string(),
        ..Config::default()
    }
}

fn assembler(server: &MockServer, root: &Path, config: &Config) -> ProfileAssembler<GithubClient> {
    build_assembler(&args(server, root), config, root).unwrap()
}

async fn mock_github(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{}", LOGIN)))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(
                r#"{{"login": "{}", "name": "The Octocat", "avatar_url": "https://avatars.example/octocat"}}"#,
                LOGIN
            ),
            "application/json",
        ))
        .mount(server)
        .await;

    let mut repos = Vec::new();
    for (i, language) in ["Python", "HTML", "CSS"].iter().enumerate() {
        repos.push(format!(
            r#"{{
                "name": "repo_{i}",
                "description": "Repository {i}",
                "html_url": "https://github.com/{login}/repo_{i}",
                "language": "{language}",
                "stargazers_count": {stars},
                "pushed_at": "2026-0{month}-01T00:00:00Z",
                "languages_url": "{uri}/repos/{login}/repo_{i}/languages"
            }}"#,
            i = i,
            login = LOGIN,
            language = language,
            stars = 10 * (i + 1),
            month = 3 - i,
            uri = server.uri(),
        ));
    }
    Mock::given(method("GET"))
        .and(path(format!("/users/{}/repos", LOGIN)))
        .and(query_param("sort", "pushed"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(format!("[{}]", repos.join(",")), "application/json"))
        .mount(server)
        .await;

    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let push = format!(r#"{{"type": "PushEvent", "created_at": "{}"}}"#, now);
    let watch = format!(r#"{{"type": "WatchEvent", "created_at": "{}"}}"#, now);
    let mut events = vec![push; PUSHES_NOW];
    events.push(watch);
    Mock::given(method("GET"))
        .and(path(format!("/users/{}/events", LOGIN)))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(format!("[{}]", events.join(",")), "application/json"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/users/{}/events", LOGIN)))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .mount(server)
        .await;

    for i in 0..3 {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{}/repo_{}/commits", LOGIN, i)))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/{}/repo_{}/languages", LOGIN, i)))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path(format!("/{}/{}/master/README.md", LOGIN, LOGIN)))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Hi from master"))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn happy_path() {
    let server = MockServer::start().await;
    mock_github(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let profile = assembler(&server, dir.path(), &config()).assemble().await;

    assert_eq!(profile.name, "The Octocat");
    assert_eq!(profile.avatar_url, "https://avatars.example/octocat");
    assert_eq!(profile.bio, "Maths and Python");
    assert_eq!(profile.total_repos, 3);
    assert_eq!(profile.total_stars, 60);
    assert_eq!(profile.readme_content, "<h1>Hi from master</h1>\n");
    let recent: Vec<&str> = profile.recent_repos.iter().map(|repo| repo.name.as_str()).collect();
    assert_eq!(recent, vec!["repo_0", "repo_1", "repo_2"]);
    let tech: Vec<&str> = profile.tech_stack.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(tech, vec!["Python", "HTML/CSS"]);
    assert_eq!(
        profile.activity_data[10..],
        [(PUSHES_NOW / 3) as u32, (PUSHES_NOW / 2) as u32],
        "Pushes made now land in the newest month"
    );
    assert!(profile.activity_data.iter().all(|&count| count <= 200));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn token_from_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/users/{}", LOGIN)))
        .and(wiremock::matchers::header("Authorization", "token config-token"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"login": "octocat", "name": null, "avatar_url": "https://avatars.example/1"}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let profile = assembler(&server, dir.path(), &config()).assemble().await;

    assert_eq!(profile.name, "Configured", "Repository listing fails, so the defaults are used");
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_user_gets_default_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/users/{}", LOGIN)))
        .respond_with(ResponseTemplate::new(404).set_body_raw(r#"{"message": "Not Found"}"#, "application/json"))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Introduction.md"), "Local *intro*").unwrap();

    let profile = assembler(&server, dir.path(), &config()).assemble().await;

    assert_eq!(profile.name, "Configured");
    assert_eq!(profile.total_repos, 0);
    assert_eq!(profile.total_stars, 0);
    assert_eq!(profile.readme_content, "<p>Local <em>intro</em></p>\n");
    assert_eq!(profile.activity_data, FALLBACK_ACTIVITY);
    assert_eq!(profile.tech_stack, fallback_tech_stack());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rate_limited_gets_default_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403).set_body_raw(r#"{"message": "API rate limit exceeded"}"#, "application/json"),
        )
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let profile = assembler(&server, dir.path(), &config()).assemble().await;

    assert_eq!(profile.total_repos, 0);
    assert_eq!(profile.activity_data, FALLBACK_ACTIVITY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn serves_page_config_and_files() {
    let server = MockServer::start().await;
    mock_github(&server).await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("background.jpg"), b"jpeg bytes").unwrap();
    let config = config();
    let state = AppState {
        assembler: assembler(&server, dir.path(), &config),
        config,
        root: dir.path().to_path_buf(),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum_serve(listener, Arc::new(state)).await });
    let base = format!("http://{}", addr);

    let page = reqwest::get(&base).await.unwrap();
    assert_eq!(page.status(), 200);
    let page = page.text().await.unwrap();
    assert!(page.contains("The Octocat"));
    assert!(page.contains("HTML/CSS"));
    assert!(page.contains(r#"url("/background.jpg")"#));

    let config: serde_json::Value = reqwest::get(format!("{}/api/config", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(config["github_url"], "https://github.com/octocat");
    assert_eq!(config["github_token"], "", "Token is never served");

    let image = reqwest::get(format!("{}/background.jpg", base)).await.unwrap();
    assert_eq!(image.status(), 200);
    assert_eq!(image.headers()["content-type"], "image/jpeg");
    assert_eq!(image.bytes().await.unwrap().as_ref(), b"jpeg bytes");

    let hidden = reqwest::get(format!("{}/config.json", base)).await.unwrap();
    assert_eq!(hidden.status(), 404);
    let missing = reqwest::get(format!("{}/missing.png", base)).await.unwrap();
    assert_eq!(missing.status(), 404);
}

async fn axum_serve(listener: tokio::net::TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn export_writes_static_site() {
    let server = MockServer::start().await;
    mock_github(&server).await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("background.jpg"), b"jpeg bytes").unwrap();
    std::fs::write(dir.path().join("favicon.ico"), b"ico").unwrap();
    let out = dir.path().join("static_build");
    std::fs::create_dir(&out).unwrap();
    std::fs::write(out.join("stale.html"), "old").unwrap();
    let config = config();

    let index = export::export_static(&assembler(&server, dir.path(), &config), &config, dir.path(), &out)
        .await
        .unwrap();

    assert_eq!(index, out.join("index.html"));
    let html = std::fs::read_to_string(&index).unwrap();
    assert!(html.contains("The Octocat"));
    assert!(html.contains("<h1>Hi from master</h1>"));
    assert!(!out.join("stale.html").exists());
    assert_eq!(std::fs::read(out.join("background.jpg")).unwrap(), b"jpeg bytes");
    assert_eq!(std::fs::read(out.join("favicon.ico")).unwrap(), b"ico");
}
