//! Maintenance commands.
//!
//! ```text
//! likes migrate
//! likes reset <resource_id>...
//! likes counts <resource_id>
//! likes top <limit> [like_count|dislike_count|vote_count]
//! likes rebuild-counts
//! likes delete-actor <owner_id>
//! likes delete-resource <resource_id>
//! ```
use likes_shared::types::{OwnerId, RankBy, RankingQuery, ResourceId};
use serde_json::json;
use tracing::info;

use crate::config::Dependencies;
use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Migrations run on startup, so this only connects.
    Migrate,
    Reset(Vec<ResourceId>),
    Counts(ResourceId),
    Top { limit: u64, rank_by: RankBy },
    RebuildCounts,
    DeleteActor(OwnerId),
    DeleteResource(ResourceId),
}

fn parse_id(value: Option<String>, what: &str) -> Result<i64, AppError> {
    let value = value.ok_or_else(|| AppError::usage(format!("missing {}", what)))?;
    value
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::usage(format!("invalid {}: {}", what, value)))
}

fn parse_rank_by(value: &str) -> Result<RankBy, AppError> {
    match value {
        "like_count" => Ok(RankBy::LikeCount),
        "dislike_count" => Ok(RankBy::DislikeCount),
        "vote_count" => Ok(RankBy::VoteCount),
        other => Err(AppError::usage(format!("unknown ranking: {}", other))),
    }
}

impl Command {
    /// Parses the command line, without the program name.
    pub fn parse<I>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let name = args
            .next()
            .ok_or_else(|| AppError::usage("missing command"))?;

        match name.as_str() {
            "migrate" => Ok(Command::Migrate),
            "rebuild-counts" => Ok(Command::RebuildCounts),
            "reset" => {
                let ids = args
                    .map(|arg| parse_id(Some(arg), "resource id"))
                    .collect::<Result<Vec<_>, _>>()?;
                if ids.is_empty() {
                    return Err(AppError::usage("reset needs at least one resource id"));
                }
                Ok(Command::Reset(ids))
            }
            "counts" => Ok(Command::Counts(parse_id(args.next(), "resource id")?)),
            "top" => {
                let limit = parse_id(args.next(), "limit")? as u64;
                let rank_by = match args.next() {
                    Some(value) => parse_rank_by(&value)?,
                    None => RankBy::default(),
                };
                Ok(Command::Top { limit, rank_by })
            }
            "delete-actor" => Ok(Command::DeleteActor(parse_id(args.next(), "owner id")?)),
            "delete-resource" => Ok(Command::DeleteResource(parse_id(
                args.next(),
                "resource id",
            )?)),
            other => Err(AppError::usage(format!("unknown command: {}", other))),
        }
    }

    /// Runs the command and prints its result as JSON.
    pub async fn execute(&self, deps: &Dependencies) -> Result<(), AppError> {
        let output = match self {
            Command::Migrate => json!({ "migrated": true }),
            Command::Reset(resource_ids) => {
                let deleted = deps.service.batch_reset(resource_ids).await?;
                json!({ "deleted": deleted })
            }
            Command::Counts(resource_id) => {
                let counts = deps.service.counts(*resource_id).await?;
                let shown = deps.service.settings().display_counts(&counts);
                json!({ "resource_id": resource_id, "counts": counts, "shown": shown })
            }
            Command::Top { limit, rank_by } => {
                let ranking = deps
                    .service
                    .rank_resources(&RankingQuery::top(*rank_by, *limit), None)
                    .await?;
                serde_json::to_value(&ranking)?
            }
            Command::RebuildCounts => {
                let resources = deps.store.rebuild_counts().await?;
                json!({ "resources": resources })
            }
            Command::DeleteActor(owner_id) => {
                let deleted = deps.service.actor_deleted(*owner_id).await?;
                json!({ "deleted": deleted })
            }
            Command::DeleteResource(resource_id) => {
                let deleted = deps.service.resource_deleted(*resource_id).await?;
                json!({ "deleted": deleted })
            }
        };
        info!(command = ?self, "Command completed");
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(args("migrate")).unwrap(), Command::Migrate);
        assert_eq!(
            Command::parse(args("reset 1 2 3")).unwrap(),
            Command::Reset(vec![1, 2, 3])
        );
        assert_eq!(Command::parse(args("counts 7")).unwrap(), Command::Counts(7));
        assert_eq!(
            Command::parse(args("top 5 vote_count")).unwrap(),
            Command::Top {
                limit: 5,
                rank_by: RankBy::VoteCount
            }
        );
        assert_eq!(
            Command::parse(args("top 5")).unwrap(),
            Command::Top {
                limit: 5,
                rank_by: RankBy::LikeCount
            }
        );
        assert_eq!(
            Command::parse(args("delete-actor 4")).unwrap(),
            Command::DeleteActor(4)
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let lines = [
            "",
            "reset",
            "reset 1 x",
            "counts",
            "counts -2",
            "top 3 popularity",
            "vacuum",
        ];
        for line in lines {
            assert!(
                matches!(Command::parse(args(line)), Err(AppError::Usage(_))),
                "accepted {:?}",
                line
            );
        }
    }
}
