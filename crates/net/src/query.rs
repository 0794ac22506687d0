//! NRQL execution for the recipe validator

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use waypoint_errors::Error;
use waypoint_validation::{QueryClient, QueryRow};

use crate::client::GraphQlClient;

const NRQL_QUERY: &str = "query($accountId: Int!, $nrql: Nrql!) { \
     actor { account(id: $accountId) { nrql(query: $nrql) { results } } } }";

#[derive(Deserialize)]
struct ActorData {
    actor: Actor,
}

#[derive(Deserialize)]
struct Actor {
    account: Account,
}

#[derive(Deserialize)]
struct Account {
    nrql: NrqlResult,
}

#[derive(Deserialize)]
struct NrqlResult {
    #[serde(default)]
    results: Vec<QueryRow>,
}

#[async_trait]
impl QueryClient for GraphQlClient {
    async fn query(&self, nrql: &str) -> Result<Vec<QueryRow>, Error> {
        tracing::debug!(account_id = self.account_id(), nrql, "running validation query");
        let variables = json!({ "accountId": self.account_id(), "nrql": nrql });
        let data: ActorData = self.execute(NRQL_QUERY, &variables).await?;
        Ok(data.actor.account.nrql.results)
    }
}
