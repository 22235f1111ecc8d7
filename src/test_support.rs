//! Shared helpers for unit tests

use crate::models::{Coordinates, FireDetection, RegionAggregates};
use crate::remote_sensing::{OverlayKind, RemoteSensing, SensingQuery, TileLayer};
use crate::{FireWatchError, Result};
use async_trait::async_trait;
use axum::Router;
use std::sync::Mutex;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// In-memory remote-sensing backend
#[derive(Default)]
pub struct FakeSensing {
    pub count: Option<u64>,
    pub hotspots: Vec<FireDetection>,
    pub aggregates: RegionAggregates,
    pub fail: bool,
    pub queries: Mutex<Vec<SensingQuery>>,
}

impl FakeSensing {
    pub fn with_hotspots(points: &[(f64, f64)]) -> Self {
        Self {
            count: Some(points.len() as u64),
            hotspots: points
                .iter()
                .map(|&(lat, lon)| FireDetection {
                    coordinates: Coordinates::new(lat, lon),
                    brightness: Some(340.0),
                })
                .collect(),
            aggregates: RegionAggregates {
                ndvi: Some(3500.0),
                elevation: Some(640.0),
                bright_ti4: Some(336.0),
                bright_ti5: Some(295.0),
                frp: Some(12.5),
            },
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn check(&self, query: &SensingQuery) -> Result<()> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(FireWatchError::remote_sensing("platform unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSensing for FakeSensing {
    async fn detection_count(&self, query: &SensingQuery) -> Result<u64> {
        self.check(query)?;
        Ok(self.count.unwrap_or_default())
    }

    async fn hotspots(&self, query: &SensingQuery) -> Result<Vec<FireDetection>> {
        self.check(query)?;
        Ok(self.hotspots.clone())
    }

    async fn region_aggregates(&self, query: &SensingQuery) -> Result<RegionAggregates> {
        self.check(query)?;
        Ok(self.aggregates)
    }

    async fn overlay(&self, query: &SensingQuery, kind: OverlayKind) -> Result<TileLayer> {
        self.check(query)?;
        Ok(TileLayer {
            name: kind.title().to_string(),
            url_template: format!("https://tiles.test/{kind:?}/{{z}}/{{x}}/{{y}}"),
            attribution: kind.attribution().to_string(),
        })
    }
}
