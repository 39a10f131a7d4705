pub mod archiver;
pub mod audit;
pub mod dispatch;
pub mod frontmatter;
pub mod lock;
pub mod mailer;
pub mod metadata;
pub mod paths;
pub mod repository;
pub mod settings;
pub mod template;
pub mod vault;
pub mod warn;
pub mod workspace;
