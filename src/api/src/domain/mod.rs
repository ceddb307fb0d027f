pub mod correction_repository;
pub mod correction_request;
pub mod email_client;
pub mod employee_number;
pub mod registry_snapshot;
pub mod remote_store;
pub mod requested_service;
pub mod statistics;
pub mod status;
pub mod subscriber;
pub mod subscriber_email;
pub mod subscriber_name;
pub mod subscriber_repository;

pub use correction_repository::CorrectionRepository;
pub use correction_request::{ArticleFile, CorrectionRecord, NewCorrectionRequest};
pub use email_client::{Attachment, EmailClient};
pub use employee_number::EmployeeNumber;
pub use registry_snapshot::RegistrySnapshot;
pub use remote_store::{RemoteStore, RemoteStoreError};
pub use requested_service::RequestedService;
pub use status::Status;
pub use subscriber::{NewSubscriber, SubscriberRecord};
pub use subscriber_email::SubscriberEmail;
pub use subscriber_name::SubscriberName;
pub use subscriber_repository::{RepositoryError, SubscriberRepository};
