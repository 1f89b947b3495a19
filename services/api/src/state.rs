//! Application state shared across handlers

use std::sync::Arc;

use attendance::analytics::AnalyticsEngine;
use attendance::curriculum::StaticCurriculum;
use attendance::marking::MarkingEngine;
use attendance::register::RegisterBuilder;
use attendance::registry::SessionCodeRegistry;
use attendance::AttendanceConfig;
use sqlx::PgPool;

use crate::repositories::{AttendanceRepository, RosterRepository, SessionCodeRepository};

pub type Registry = SessionCodeRegistry<SessionCodeRepository>;
pub type Marking = MarkingEngine<RosterRepository, SessionCodeRepository, AttendanceRepository>;
pub type Analytics =
    AnalyticsEngine<RosterRepository, SessionCodeRepository, AttendanceRepository, StaticCurriculum>;
pub type Register = RegisterBuilder<RosterRepository, SessionCodeRepository, AttendanceRepository>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub roster: RosterRepository,
    pub registry: Arc<Registry>,
    pub marking: Arc<Marking>,
    pub analytics: Arc<Analytics>,
    pub register: Arc<Register>,
}

impl AppState {
    pub fn new(pool: PgPool, curriculum: StaticCurriculum, config: AttendanceConfig) -> Self {
        let roster = RosterRepository::new(pool.clone());
        let sessions = SessionCodeRepository::new(pool.clone());
        let ledger = AttendanceRepository::new(pool.clone());

        Self {
            registry: Arc::new(SessionCodeRegistry::new(sessions.clone(), config.clone())),
            marking: Arc::new(MarkingEngine::new(
                roster.clone(),
                sessions.clone(),
                ledger.clone(),
                config.clone(),
            )),
            analytics: Arc::new(AnalyticsEngine::new(
                roster.clone(),
                sessions.clone(),
                ledger.clone(),
                curriculum,
                &config,
            )),
            register: Arc::new(RegisterBuilder::new(roster.clone(), sessions, ledger)),
            roster,
            db_pool: pool,
        }
    }
}
