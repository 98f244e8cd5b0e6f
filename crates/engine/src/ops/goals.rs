use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    FinancialGoal, FinancialGoalNew, FinancialGoalPatch, GoalStatus, ResultEngine, goals, util,
};

use super::{Engine, access::scope_condition, with_tx};

const MAX_GOAL_NAME_LEN: usize = 200;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GoalFilter {
    pub status: Option<GoalStatus>,
}

impl Engine {
    pub async fn create_goal(
        &self,
        actor: Uuid,
        new: FinancialGoalNew,
    ) -> ResultEngine<FinancialGoal> {
        let goal_name = util::normalize_required_name(&new.goal_name, "goal", MAX_GOAL_NAME_LEN)?;
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let family_id = self
                .creation_family(&db_tx, actor, scope, new.family_id)
                .await?;

            let now = Utc::now();
            let current_amount = new.current_amount.unwrap_or_default();
            let goal = FinancialGoal {
                id: Uuid::new_v4(),
                user_id: actor,
                family_id,
                goal_name,
                goal_type: new.goal_type,
                target_amount: new.target_amount,
                current_amount,
                target_date: new.target_date,
                priority: new.priority.unwrap_or_default(),
                status: GoalStatus::default(),
                notes: util::normalize_optional_text(new.notes),
                progress_percent: current_amount.percent_of(new.target_amount),
                created_at: now,
                updated_at: now,
            };
            goal.validate()?;

            let model: goals::ActiveModel = (&goal).into();
            model.insert(&db_tx).await?;
            Ok(goal)
        })
    }

    /// Goals of the actor's scope, soonest target first; undated goals last.
    pub async fn list_goals(
        &self,
        actor: Uuid,
        filter: GoalFilter,
    ) -> ResultEngine<Vec<FinancialGoal>> {
        with_tx!(self, |db_tx| {
            let (_, scope) = self.actor_scope(&db_tx, actor).await?;
            let mut query = goals::Entity::find()
                .filter(scope_condition::<goals::Entity>(scope))
                .order_by_asc(goals::Column::TargetDate.is_null())
                .order_by_asc(goals::Column::TargetDate)
                .order_by_asc(goals::Column::CreatedAt);
            if let Some(status) = filter.status {
                query = query.filter(goals::Column::Status.eq(status.as_str()));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(FinancialGoal::try_from)
                .collect()
        })
    }

    pub async fn get_goal(&self, actor: Uuid, goal_id: Uuid) -> ResultEngine<FinancialGoal> {
        with_tx!(self, |db_tx| {
            let model = self.require_goal_read(&db_tx, actor, goal_id).await?;
            FinancialGoal::try_from(model)
        })
    }

    pub async fn update_goal(
        &self,
        actor: Uuid,
        goal_id: Uuid,
        mut patch: FinancialGoalPatch,
    ) -> ResultEngine<FinancialGoal> {
        if let Some(name) = patch.goal_name.take() {
            patch.goal_name = Some(util::normalize_required_name(
                &name,
                "goal",
                MAX_GOAL_NAME_LEN,
            )?);
        }
        patch.notes = patch.notes.map(util::normalize_optional_text);

        with_tx!(self, |db_tx| {
            let model = self.require_goal_write(&db_tx, actor, goal_id).await?;
            let mut goal = FinancialGoal::try_from(model)?;
            patch.apply(&mut goal);
            goal.updated_at = Utc::now();
            goal.validate()?;

            let model: goals::ActiveModel = (&goal).into();
            model.update(&db_tx).await?;
            Ok(goal)
        })
    }

    pub async fn delete_goal(&self, actor: Uuid, goal_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_goal_write(&db_tx, actor, goal_id).await?;
            goals::Entity::delete_by_id(goal_id).exec(&db_tx).await?;
            Ok(())
        })
    }
}
