//! Caller-facing board operations.
//!
//! Every read follows the same sequence: validate the view spec, reconcile
//! overdue state, select, then project or summarize. Reconciliation errors
//! are demoted to [`ReconcileWarning`]s and the read proceeds on whatever
//! the store holds; select errors fail the request.

use crate::config::{Config, ViewConfig};
use crate::dashboard::{self, Dashboard, Summary};
use crate::db::Database;
use crate::error::{BoardResult, StoreError};
use crate::patch::{EventDraft, EventPatch, TaskDraft, TaskPatch};
use crate::reconcile::{self, ReconcileTarget, ReconcileWarning};
use crate::store::{EventFilter, EventOrder, RecordStore, SpaceFilter, TaskFilter, TaskOrder};
use crate::types::{Event, EventId, Space, SpaceId, Task, TaskId, Timestamp};
use crate::view::{
    self, CompiledSpec, Entity, Projection, ViewContext, ViewSession, ViewSpec,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// A projection plus any reconciliation warnings raised while loading it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView<T> {
    pub projection: Projection<T>,
    pub warnings: Vec<ReconcileWarning>,
}

/// A single record with the name of the space it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detail<T> {
    pub record: T,
    pub space_name: String,
    pub warnings: Vec<ReconcileWarning>,
}

/// Everything shown on one space's page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceDetail {
    pub space: Space,
    pub tasks: Projection<Task>,
    pub events: Projection<Event>,
    pub warnings: Vec<ReconcileWarning>,
}

/// Dashboard counts plus reconciliation warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryView {
    pub summary: Summary,
    pub warnings: Vec<ReconcileWarning>,
}

/// Dashboard page contents plus reconciliation warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub dashboard: Dashboard,
    pub warnings: Vec<ReconcileWarning>,
}

/// Read and save operations over a [`RecordStore`].
pub struct Board<S> {
    store: S,
    view: ViewConfig,
}

impl Board<Database> {
    /// Validate `config`, create the database directory and open the store.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        config.ensure_db_dir()?;
        let db = Database::open(&config.store.db_path).with_context(|| {
            format!("Failed to open database: {}", config.store.db_path.display())
        })?;
        Ok(Self::new(db, config.view.clone()))
    }
}

impl<S: RecordStore> Board<S> {
    pub fn new(store: S, view: ViewConfig) -> Self {
        Self { store, view }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Default task spec at the configured page window.
    pub fn task_spec(&self) -> ViewSpec {
        ViewSpec::tasks().with_page_window(self.view.page_window)
    }

    /// Default event spec at the configured page window.
    pub fn event_spec(&self) -> ViewSpec {
        ViewSpec::events().with_page_window(self.view.page_window)
    }

    /// The owner's space ids in display order.
    pub fn spaces_for_owner(&self, owner_id: &str) -> BoardResult<Vec<SpaceId>> {
        let spaces = self.store.select_spaces(&SpaceFilter::by_owner(owner_id))?;
        Ok(spaces.into_iter().map(|s| s.id).collect())
    }

    /// Reconcile, load and project the tasks of `space_ids`.
    ///
    /// Page windows come from `session`, so they never outlive the spec
    /// they were opened under.
    pub fn task_board(
        &self,
        space_ids: &[SpaceId],
        session: &ViewSession,
        now: Timestamp,
    ) -> BoardResult<BoardView<Task>> {
        let spec = session.spec();
        CompiledSpec::compile(spec, Entity::Task)?;

        let warnings: Vec<_> = reconcile::soften(
            ReconcileTarget::Tasks,
            reconcile::reconcile_tasks(&self.store, space_ids, now),
        )
        .into_iter()
        .collect();

        let spaces = self.spaces_in_order(space_ids)?;
        let tasks = self
            .store
            .select_tasks(&TaskFilter::in_spaces(space_ids), TaskOrder::CreatedDesc)?;
        debug!(spaces = spaces.len(), tasks = tasks.len(), "loaded task board");

        let projection = view::project(&tasks, &ViewContext::new(&spaces, now), spec, session.windows())?;
        Ok(BoardView {
            projection,
            warnings,
        })
    }

    /// Reconcile, load and project the events of `space_ids`.
    pub fn event_board(
        &self,
        space_ids: &[SpaceId],
        session: &ViewSession,
        now: Timestamp,
    ) -> BoardResult<BoardView<Event>> {
        let spec = session.spec();
        CompiledSpec::compile(spec, Entity::Event)?;

        let warnings: Vec<_> = reconcile::soften(
            ReconcileTarget::Events,
            reconcile::reconcile_events(&self.store, space_ids, now),
        )
        .into_iter()
        .collect();

        let spaces = self.spaces_in_order(space_ids)?;
        let events = self
            .store
            .select_events(&EventFilter::in_spaces(space_ids), EventOrder::DateAsc)?;
        debug!(spaces = spaces.len(), events = events.len(), "loaded event board");

        let projection = view::project(&events, &ViewContext::new(&spaces, now), spec, session.windows())?;
        Ok(BoardView {
            projection,
            warnings,
        })
    }

    /// Reconcile both tables, then count.
    pub fn dashboard_summary(
        &self,
        space_ids: &[SpaceId],
        now: Timestamp,
    ) -> BoardResult<SummaryView> {
        let (tasks, events, warnings) = self.load_all(space_ids, now)?;
        Ok(SummaryView {
            summary: dashboard::summarize(&tasks, &events, now),
            warnings,
        })
    }

    /// Summary, newest tasks and next events across all of the owner's spaces.
    pub fn dashboard(&self, owner_id: &str, now: Timestamp) -> BoardResult<DashboardView> {
        let space_ids = self.spaces_for_owner(owner_id)?;
        let (tasks, events, warnings) = self.load_all(&space_ids, now)?;

        let dashboard = Dashboard {
            summary: dashboard::summarize(&tasks, &events, now),
            recent_tasks: dashboard::recent_tasks(&tasks, self.view.recent_tasks_limit),
            upcoming_events: dashboard::upcoming_events(
                &events,
                now,
                self.view.upcoming_events_limit,
            ),
        };
        Ok(DashboardView {
            dashboard,
            warnings,
        })
    }

    /// One task, refreshed on its own.
    pub fn task_detail(&self, id: TaskId, now: Timestamp) -> BoardResult<Option<Detail<Task>>> {
        let warnings: Vec<_> = reconcile::soften(
            ReconcileTarget::Tasks,
            reconcile::reconcile_task_by_id(&self.store, id, now),
        )
        .into_iter()
        .collect();

        let Some(task) = self
            .store
            .select_tasks(&TaskFilter::by_id(id), TaskOrder::default())?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let space_name = self.space_name(task.space_id)?;
        Ok(Some(Detail {
            record: task,
            space_name,
            warnings,
        }))
    }

    /// One event, refreshed on its own.
    pub fn event_detail(&self, id: EventId, now: Timestamp) -> BoardResult<Option<Detail<Event>>> {
        let warnings: Vec<_> = reconcile::soften(
            ReconcileTarget::Events,
            reconcile::reconcile_event_by_id(&self.store, id, now),
        )
        .into_iter()
        .collect();

        let Some(event) = self
            .store
            .select_events(&EventFilter::by_id(id), EventOrder::default())?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let space_name = self.space_name(event.space_id)?;
        Ok(Some(Detail {
            record: event,
            space_name,
            warnings,
        }))
    }

    /// A space's own page: tasks bucketed by status, events by date, neither
    /// grouped by space.
    pub fn space_detail(
        &self,
        space_id: SpaceId,
        tasks: &ViewSession,
        events: &ViewSession,
        now: Timestamp,
    ) -> BoardResult<Option<SpaceDetail>> {
        let task_spec = tasks
            .spec()
            .clone()
            .grouped_by("none")
            .with_status_buckets(true);
        let event_spec = events.spec().clone().grouped_by("none");
        CompiledSpec::compile(&task_spec, Entity::Task)?;
        CompiledSpec::compile(&event_spec, Entity::Event)?;

        let Some(space) = self
            .store
            .select_spaces(&SpaceFilter::by_ids(&[space_id]))?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let (task_rows, event_rows, warnings) = self.load_all(&[space_id], now)?;
        let spaces = [space];
        let ctx = ViewContext::new(&spaces, now);
        let tasks = view::project(&task_rows, &ctx, &task_spec, tasks.windows())?;
        let events = view::project(&event_rows, &ctx, &event_spec, events.windows())?;
        let [space] = spaces;

        Ok(Some(SpaceDetail {
            space,
            tasks,
            events,
            warnings,
        }))
    }

    /// Persist the fields of `draft` that differ from `task`.
    pub fn save_task(&self, task: &Task, draft: &TaskDraft) -> BoardResult<Task> {
        let patch = TaskPatch::diff(task, draft)?;
        if patch.is_empty() {
            return Ok(task.clone());
        }
        let filter = TaskFilter::by_id(task.id);
        if self.store.update_tasks(&filter, &patch)? == 0 {
            return Err(StoreError::not_found("tasks", task.id).into());
        }
        self.store
            .select_tasks(&filter, TaskOrder::default())?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("tasks", task.id).into())
    }

    /// Persist the fields of `draft` that differ from `event`.
    pub fn save_event(&self, event: &Event, draft: &EventDraft) -> BoardResult<Event> {
        let patch = EventPatch::diff(event, draft)?;
        if patch.is_empty() {
            return Ok(event.clone());
        }
        let filter = EventFilter::by_id(event.id);
        if self.store.update_events(&filter, &patch)? == 0 {
            return Err(StoreError::not_found("events", event.id).into());
        }
        self.store
            .select_events(&filter, EventOrder::default())?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("events", event.id).into())
    }

    /// Reconcile both tables concurrently, then load both.
    fn load_all(
        &self,
        space_ids: &[SpaceId],
        now: Timestamp,
    ) -> BoardResult<(Vec<Task>, Vec<Event>, Vec<ReconcileWarning>)> {
        let (task_warning, event_warning) = rayon::join(
            || {
                reconcile::soften(
                    ReconcileTarget::Tasks,
                    reconcile::reconcile_tasks(&self.store, space_ids, now),
                )
            },
            || {
                reconcile::soften(
                    ReconcileTarget::Events,
                    reconcile::reconcile_events(&self.store, space_ids, now),
                )
            },
        );
        let warnings = task_warning.into_iter().chain(event_warning).collect();

        let tasks = self
            .store
            .select_tasks(&TaskFilter::in_spaces(space_ids), TaskOrder::CreatedDesc)?;
        let events = self
            .store
            .select_events(&EventFilter::in_spaces(space_ids), EventOrder::DateAsc)?;
        Ok((tasks, events, warnings))
    }

    /// Spaces for `space_ids`, in the caller's order, skipping unknown ids.
    fn spaces_in_order(&self, space_ids: &[SpaceId]) -> BoardResult<Vec<Space>> {
        let mut found = self.store.select_spaces(&SpaceFilter::by_ids(space_ids))?;
        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(found.len());
        for id in space_ids {
            if !seen.insert(*id) {
                continue;
            }
            if let Some(pos) = found.iter().position(|s| s.id == *id) {
                ordered.push(found.swap_remove(pos));
            }
        }
        Ok(ordered)
    }

    fn space_name(&self, space_id: SpaceId) -> BoardResult<String> {
        self.store
            .select_spaces(&SpaceFilter::by_ids(&[space_id]))?
            .into_iter()
            .next()
            .map(|s| s.name)
            .ok_or_else(|| StoreError::not_found("spaces", space_id).into())
    }
}
