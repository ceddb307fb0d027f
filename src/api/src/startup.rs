use crate::adapters::{
    CsvCorrectionRepository, CsvSubscriberRepository, LocalDirectoryRemoteStore,
    PostmarkEmailClient, SftpRemoteStore, SmtpEmailClient,
};
use crate::authentication::{reject_anonymous_users, AdminCredentials};
use crate::broadcast::{BroadcastPacing, BroadcastTracker, Broadcaster};
use crate::clock::InstitutionClock;
use crate::configuration::{EmailClientSettings, EmailTransport, RemoteSettings, Settings};
use crate::domain::correction_repository::CorrectionRepository;
use crate::domain::email_client::EmailClient;
use crate::domain::remote_store::RemoteStore;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_repository::SubscriberRepository;
use crate::registry::Registries;
use crate::routes::{
    admin_dashboard, convocatoria_admin_page, convocatorias_page, correction_form,
    delete_convocatoria_pdf, download_registry, health_check, home, log_out, login, login_form,
    monitoring_dashboard, monitoring_summary, reactivate_subscriber, register_subscriber,
    replace_registry, start_broadcast, submit_correction, unsubscribe,
    upload_convocatoria_pdf,
};
use actix_multipart::form::MultipartFormConfig;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::dev::{Server, Service};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::web::Data;
use actix_web::{web, App, HttpMessage, HttpServer};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::FlashMessagesFramework;
use actix_web_lab::middleware::from_fn;
use anyhow::{anyhow, Context};
use secrecy::ExposeSecret;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use telemetry::CustomLevelRootSpanBuilder;
use tracing_actix_web::{RequestId, TracingLogger};

const UPLOAD_TOTAL_LIMIT: usize = 30 * 1024 * 1024;

/// Address that receives staff notifications and broadcast reports.
pub struct NotificationRecipient(pub SubscriberEmail);

/// Registry row whose employee number counts the broadcasts sent.
pub struct CounterEmail(pub SubscriberEmail);

pub struct UploadsDirectory(pub PathBuf);

pub fn build_remote_store(settings: &RemoteSettings) -> Arc<dyn RemoteStore> {
    if settings.use_local {
        tracing::info!(directory = %settings.directory, "Using a local directory as the remote host");
        Arc::new(LocalDirectoryRemoteStore::new(settings.directory.clone()))
    } else {
        Arc::new(SftpRemoteStore::new(settings))
    }
}

pub fn build_email_client(
    settings: &EmailClientSettings,
) -> Result<Arc<dyn EmailClient>, anyhow::Error> {
    let sender = settings.sender().map_err(|e| anyhow!(e))?;
    let client: Arc<dyn EmailClient> = match settings.transport {
        EmailTransport::Smtp => Arc::new(SmtpEmailClient::new(
            &settings.smtp_server,
            settings.smtp_port,
            settings.smtp_username.clone(),
            settings.smtp_password.clone(),
            sender,
            settings.timeout(),
        )?),
        EmailTransport::Postmark => Arc::new(PostmarkEmailClient::new(
            settings.base_url.clone(),
            sender,
            settings.authorization_token.clone(),
            settings.timeout(),
        )),
    };
    Ok(client)
}

/// The services shared by the web application and the `broadcast` binary.
#[derive(Clone)]
pub struct Components {
    pub registries: Registries,
    pub store: Arc<dyn RemoteStore>,
    pub subscribers: Arc<dyn SubscriberRepository>,
    pub corrections: Arc<dyn CorrectionRepository>,
    pub email_client: Arc<dyn EmailClient>,
    pub clock: InstitutionClock,
    pub notification_recipient: SubscriberEmail,
    pub counter_email: SubscriberEmail,
    pub pacing: BroadcastPacing,
}

impl Components {
    pub fn build(configuration: &Settings) -> Result<Self, anyhow::Error> {
        let timezone = configuration
            .application
            .timezone()
            .map_err(|e| anyhow!(e))?;
        let notification_recipient = configuration
            .email_settings
            .notification_recipient()
            .map_err(|e| anyhow!(e))
            .context("Invalid notification email")?;
        let counter_email = configuration
            .broadcast
            .counter()
            .map_err(|e| anyhow!(e))
            .context("Invalid broadcast counter email")?;

        let registries = Registries::from_settings(&configuration.registries);
        let store = build_remote_store(&configuration.remote);
        let subscribers: Arc<dyn SubscriberRepository> = Arc::new(CsvSubscriberRepository::new(
            registries.convocatorias.clone(),
            store.clone(),
        ));
        let corrections: Arc<dyn CorrectionRepository> = Arc::new(CsvCorrectionRepository::new(
            registries.correcciones.clone(),
            store.clone(),
        ));

        Ok(Self {
            registries,
            store,
            subscribers,
            corrections,
            email_client: build_email_client(&configuration.email_settings)?,
            clock: InstitutionClock::new(timezone),
            notification_recipient,
            counter_email,
            pacing: BroadcastPacing::from_settings(&configuration.broadcast),
        })
    }

    pub fn broadcaster(&self) -> Broadcaster {
        Broadcaster {
            repo: self.subscribers.clone(),
            email_client: self.email_client.clone(),
            store: self.store.clone(),
            document: self.registries.convocatoria_pdf.clone(),
            pacing: self.pacing,
            clock: self.clock,
            counter_email: self.counter_email.clone(),
            notification_email: self.notification_recipient.clone(),
        }
    }
}

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(format!(
            "{}:{}",
            configuration.application.host_name, configuration.application.application_port
        ))?;

        let port = listener.local_addr()?.port();
        let components = Components::build(&configuration)?;
        let server = run(listener, components, configuration).await?;

        Ok(Self { server, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

async fn run(
    listener: TcpListener,
    components: Components,
    configuration: Settings,
) -> Result<Server, anyhow::Error> {
    let secret_key = Key::try_from(
        configuration
            .application
            .hmac_secret
            .expose_secret()
            .as_bytes(),
    )
    .map_err(|e| anyhow!("The hmac secret cannot sign cookies: {}", e))?;
    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();
    let secure_cookies = configuration.application.secure_cookies;

    let subscribers: Data<dyn SubscriberRepository> = Data::from(components.subscribers.clone());
    let corrections: Data<dyn CorrectionRepository> = Data::from(components.corrections.clone());
    let email_client: Data<dyn EmailClient> = Data::from(components.email_client.clone());
    let store: Data<dyn RemoteStore> = Data::from(components.store.clone());
    let registries = Data::new(components.registries.clone());
    let clock = Data::new(components.clock);
    let broadcaster = Data::new(components.broadcaster());
    let tracker = Data::new(BroadcastTracker::default());
    let admin = Data::new(AdminCredentials {
        username: configuration.admin.username.clone(),
        password_hash: configuration.admin.password_hash.clone(),
    });
    let notification_recipient = Data::new(NotificationRecipient(
        components.notification_recipient.clone(),
    ));
    let counter = Data::new(CounterEmail(components.counter_email.clone()));
    let uploads = Data::new(UploadsDirectory(
        configuration.registries.uploads_directory.clone(),
    ));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(secure_cookies)
                    .build(),
            )
            .route("/", web::get().to(home))
            .service(
                web::scope("/admin")
                    .wrap(from_fn(reject_anonymous_users))
                    .route("/dashboard", web::get().to(admin_dashboard))
                    .route(
                        "/registries/{registry}/download",
                        web::get().to(download_registry),
                    )
                    .route("/registries/{registry}", web::post().to(replace_registry))
                    .route("/convocatorias", web::get().to(convocatoria_admin_page))
                    .route("/convocatorias/pdf", web::post().to(upload_convocatoria_pdf))
                    .route(
                        "/convocatorias/pdf/delete",
                        web::post().to(delete_convocatoria_pdf),
                    )
                    .route("/convocatorias/broadcast", web::post().to(start_broadcast))
                    .route("/logout", web::post().to(log_out)),
            )
            .wrap(TracingLogger::<CustomLevelRootSpanBuilder>::new())
            .wrap_fn(|req, srv| {
                let request_id = req.extensions().get::<RequestId>().copied();
                let res = srv.call(req);
                async move {
                    let mut res = res.await?;
                    if let Some(value) =
                        request_id.and_then(|id| HeaderValue::from_str(&id.to_string()).ok())
                    {
                        res.headers_mut()
                            .insert(HeaderName::from_static("x-request-id"), value);
                    }
                    Ok(res)
                }
            })
            .route("/login", web::get().to(login_form))
            .route("/login", web::post().to(login))
            .route("/health_check", web::get().to(health_check))
            .route("/convocatorias", web::get().to(convocatorias_page))
            .route("/convocatorias/register", web::post().to(register_subscriber))
            .route("/convocatorias/unsubscribe", web::post().to(unsubscribe))
            .route("/convocatorias/reactivate", web::post().to(reactivate_subscriber))
            .route("/correcciones", web::get().to(correction_form))
            .route("/correcciones", web::post().to(submit_correction))
            .route("/monitoring", web::get().to(monitoring_dashboard))
            .route("/monitoring/summary", web::get().to(monitoring_summary))
            .app_data(MultipartFormConfig::default().total_limit(UPLOAD_TOTAL_LIMIT))
            .app_data(subscribers.clone())
            .app_data(corrections.clone())
            .app_data(email_client.clone())
            .app_data(store.clone())
            .app_data(registries.clone())
            .app_data(clock.clone())
            .app_data(broadcaster.clone())
            .app_data(tracker.clone())
            .app_data(admin.clone())
            .app_data(notification_recipient.clone())
            .app_data(counter.clone())
            .app_data(uploads.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
