//! Route Catalog: read side of the route store plus baseline selection.

use tracing::{info, instrument};

use fueleu_compliance::{
    BalanceReport, ComplianceError, Route, RouteComparison, compare_routes,
};
use fueleu_core::RouteId;

use crate::error::{EngineResult, traced};
use crate::store::RouteStore;

pub struct RouteCatalog<R> {
    routes: R,
}

impl<R> RouteCatalog<R>
where
    R: RouteStore,
{
    pub fn new(routes: R) -> Self {
        Self { routes }
    }

    /// Fetch a route or fail with `NotFound`.
    pub async fn route(&self, id: &RouteId) -> EngineResult<Route> {
        self.routes
            .find_by_id(id)
            .await?
            .ok_or_else(|| ComplianceError::NotFound(id.clone()).into())
    }

    /// Current compliance balance of a route, always recomputed from the
    /// stored attributes.
    pub async fn get_balance(&self, id: &RouteId) -> EngineResult<BalanceReport> {
        let route = self.route(id).await?;
        Ok(BalanceReport::for_route(&route))
    }

    pub async fn list_routes(&self) -> EngineResult<Vec<Route>> {
        Ok(self.routes.find_all().await?)
    }

    pub async fn compare_routes(&self) -> EngineResult<Vec<RouteComparison>> {
        let routes = self.routes.find_all().await?;
        Ok(compare_routes(&routes))
    }

    /// Make `id` the only baseline route.
    #[instrument(skip(self), fields(route_id = %id))]
    pub async fn set_baseline(&self, id: &RouteId) -> EngineResult<Route> {
        traced("set_baseline", self.switch_baseline(id).await)
    }

    async fn switch_baseline(&self, id: &RouteId) -> EngineResult<Route> {
        let baseline = self
            .routes
            .set_baseline(id)
            .await?
            .ok_or_else(|| ComplianceError::NotFound(id.clone()))?;
        info!("baseline route updated");
        Ok(baseline)
    }
}
