pub mod db;
pub mod generation;
pub mod minio;
pub mod rabbitmq;
pub mod redis;
