//! Remote collaborators: the query executor contract, the GraphQL client
//! that implements it, credentials, and a scripted executor for tests.

mod credentials;
mod executor;
mod graphql;
mod mock;

pub use credentials::{CredentialProvider, EnvCredential, StaticCredential};
pub use executor::{FetchError, Page, QueryExecutor};
pub use graphql::GraphqlClient;
pub use mock::{page_of, MockExecutor};
