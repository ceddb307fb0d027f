pub mod csv_correction_repository;
pub mod csv_subscriber_repository;
pub mod csv_table;
pub mod local_remote_store;
pub mod postmark_email_client;
pub mod sftp_remote_store;
pub mod smtp_email_client;

pub use csv_correction_repository::CsvCorrectionRepository;
pub use csv_subscriber_repository::CsvSubscriberRepository;
pub use local_remote_store::LocalDirectoryRemoteStore;
pub use postmark_email_client::PostmarkEmailClient;
pub use sftp_remote_store::SftpRemoteStore;
pub use smtp_email_client::SmtpEmailClient;
