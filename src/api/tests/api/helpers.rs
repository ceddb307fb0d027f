use once_cell::sync::Lazy;
use oasis::authentication::compute_password_hash;
use oasis::configuration::{get_configuration, EmailTransport};
use oasis::startup::Application;
use secrecy::Secret;
use std::path::Path;
use telemetry::{get_subscriber, init_subscriber, init_tracer};
use tempfile::TempDir;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const COUNTER_EMAIL: &str = "convocatorias@oasis.test";
pub const NOTIFICATION_EMAIL: &str = "admin@oasis.test";

pub const SUBSCRIBERS_FILE: &str = "registro_convocatorias.csv";
pub const CORRECTIONS_FILE: &str = "registro_correccion.csv";
pub const PDF_FILE: &str = "convocatoria.pdf";

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let mut configuration = get_configuration().expect("Failed to read configuration");
    configuration.telemetry.otlp_endpoint = String::new();
    let default_filter = "info".to_string();
    let subscriber_name = "test".to_string();
    let trace_provider = init_tracer(&configuration.telemetry);

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter,
            std::io::stdout,
            &configuration.telemetry,
            &trace_provider,
        );
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter,
            std::io::sink,
            &configuration.telemetry,
            &trace_provider,
        );
        init_subscriber(subscriber);
    }
});

pub struct TestAdmin {
    pub username: String,
    pub password: String,
}

pub struct TestApp {
    pub address: String,
    pub email_server: MockServer,
    pub remote_directory: TempDir,
    pub local_directory: TempDir,
    pub admin: TestAdmin,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub fn remote_path(&self, name: &str) -> std::path::PathBuf {
        self.remote_directory.path().join(name)
    }

    /// Puts a file on the "remote host" as if staff had edited it there.
    pub fn seed_remote(&self, name: &str, content: &[u8]) {
        std::fs::write(self.remote_path(name), content).expect("Failed to seed the remote file");
    }

    pub fn read_remote(&self, name: &str) -> String {
        std::fs::read_to_string(self.remote_path(name)).expect("Failed to read the remote file")
    }

    pub fn remote_exists(&self, name: &str) -> bool {
        self.remote_path(name).exists()
    }

    pub fn uploaded_articles(&self) -> Vec<String> {
        let uploads = self.local_directory.path().join("articulos");
        match std::fs::read_dir(&uploads) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .filter(|n| !n.starts_with('.'))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn mock_email_api(&self, status: u16) {
        Mock::given(path("/email"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.email_server)
            .await;
    }

    /// Bodies of every request received by the mock email API.
    pub async fn sent_emails(&self) -> Vec<serde_json::Value> {
        self.email_server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).expect("The email body is not JSON"))
            .collect()
    }

    pub async fn get(&self, route: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}{}", &self.address, route))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_html(&self, route: &str) -> String {
        self.get(route).await.text().await.unwrap()
    }

    pub async fn post_form<Body>(&self, route: &str, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(&format!("{}{}", &self.address, route))
            .form(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_multipart(
        &self,
        route: &str,
        form: reqwest::multipart::Form,
    ) -> reqwest::Response {
        self.api_client
            .post(&format!("{}{}", &self.address, route))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_convocatorias_html(&self, email: &str) -> String {
        self.api_client
            .get(&format!("{}/convocatorias", &self.address))
            .query(&[("email", email)])
            .send()
            .await
            .expect("Failed to execute request.")
            .text()
            .await
            .unwrap()
    }

    pub async fn register_subscriber(&self, name: &str, email: &str) -> reqwest::Response {
        self.post_form(
            "/convocatorias/register",
            &serde_json::json!({
                "name": name,
                "email": email,
                "employee_number": "A-1234",
            }),
        )
        .await
    }

    pub async fn post_login<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.post_form("/login", body).await
    }

    pub async fn login_as_admin(&self) {
        let response = self
            .post_login(&serde_json::json!({
                "username": &self.admin.username,
                "password": &self.admin.password,
            }))
            .await;
        assert_is_redirect_to(&response, "/admin/dashboard");
    }

    /// Polls the admin page until the background broadcast is over.
    pub async fn wait_for_broadcast(&self) -> String {
        for _ in 0..50 {
            let html = self.get_html("/admin/convocatorias").await;
            if !html.contains("Envío en curso") {
                return html;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        panic!("The broadcast did not finish in time");
    }
}

pub fn correction_form(email: &str, confirmation: &str, file_name: &str) -> reqwest::multipart::Form {
    let article = reqwest::multipart::Part::bytes(b"PK\x03\x04 fake docx".to_vec())
        .file_name(file_name.to_string());
    reqwest::multipart::Form::new()
        .text("name", "Ana López")
        .text("email", email.to_string())
        .text("email_confirmation", confirmation.to_string())
        .text("employee_number", "A-1234")
        .text("services", "paraphrasing")
        .text("services", "style_review")
        .part("article", article)
}

pub fn file_form(file_name: &str, content: &[u8]) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(content.to_vec()).file_name(file_name.to_string());
    reqwest::multipart::Form::new().part("file", part)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    // Launch a mock server to stand in for Postmark's API
    let email_server = MockServer::start().await;
    let remote_directory = TempDir::new().expect("Failed to create the remote directory");
    let local_directory = TempDir::new().expect("Failed to create the local directory");

    let admin = TestAdmin {
        username: Uuid::new_v4().to_string(),
        password: Uuid::new_v4().to_string(),
    };

    // Randomise configuration to ensure test isolation
    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        // Use a random OS port
        c.application.application_port = 0;
        c.application.host_name = "127.0.0.1".into();
        c.application.secure_cookies = false;
        // A temporary directory stands in for the SFTP host
        c.remote.use_local = true;
        c.remote.directory = path_string(remote_directory.path());
        c.registries.convocatorias.local_file = local_directory.path().join(SUBSCRIBERS_FILE);
        c.registries.convocatorias.remote_file = SUBSCRIBERS_FILE.into();
        c.registries.correcciones.local_file = local_directory.path().join(CORRECTIONS_FILE);
        c.registries.correcciones.remote_file = CORRECTIONS_FILE.into();
        c.registries.convocatoria_pdf.local_file = local_directory.path().join(PDF_FILE);
        c.registries.convocatoria_pdf.remote_file = PDF_FILE.into();
        c.registries.uploads_directory = local_directory.path().join("articulos");
        // Use the mock server as email API
        c.email_settings.transport = EmailTransport::Postmark;
        c.email_settings.base_url = email_server.uri();
        c.email_settings.notification_email = NOTIFICATION_EMAIL.into();
        c.broadcast.counter_email = COUNTER_EMAIL.into();
        c.broadcast.pause_between_emails_milliseconds = 0;
        c.broadcast.pause_between_groups_milliseconds = 0;
        c.admin.username = admin.username.clone();
        c.admin.password_hash = compute_password_hash(Secret::new(admin.password.clone()))
            .expect("Failed to hash the admin password");
        c.telemetry.otlp_endpoint = String::new();
        c
    };

    // Launch the application as a background task
    let application = Application::build(configuration)
        .await
        .expect("Failed to build application.");
    let application_port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .unwrap();

    TestApp {
        address: format!("http://127.0.0.1:{}", application_port),
        email_server,
        remote_directory,
        local_directory,
        admin,
        api_client,
    }
}

pub fn assert_is_redirect_to(response: &reqwest::Response, location: &str) {
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers().get("Location").unwrap(), location);
}
