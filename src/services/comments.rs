use crate::constants::MAX_COMMENT_LEN;
use crate::error::{AppError, Result};
use crate::models::Comment;
use crate::security::new_record_id;
use crate::store::Store;

use super::now;

#[derive(Clone)]
pub struct CommentService {
    store: Store,
}

impl CommentService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, user_id: &str, content: &str) -> Result<Comment> {
        let content = validate_content(content)?;

        let timestamp = now();
        let comment = Comment {
            id: new_record_id(),
            user_id: user_id.to_string(),
            content,
            created: timestamp,
            updated: timestamp,
        };

        self.store.create(comment.clone()).await?;
        Ok(comment)
    }

    pub async fn get(&self, id: &str) -> Result<Comment> {
        Ok(self.store.get::<Comment>(id).await?)
    }

    /// Comments written by a user, oldest first
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<Comment>> {
        let mut comments = self
            .store
            .filter(|comment: &Comment| comment.user_id == user_id)
            .await?;
        comments.sort_by_key(|comment| comment.created);
        Ok(comments)
    }

    /// Change the text of a comment; only its author may do so
    pub async fn edit(&self, user_id: &str, id: &str, content: &str) -> Result<Comment> {
        let content = validate_content(content)?;

        let mut comment = self.owned(user_id, id).await?;
        comment.content = content;
        comment.updated = now();

        self.store.update(comment.clone()).await?;
        Ok(comment)
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        self.owned(user_id, id).await?;
        self.store.delete::<Comment>(id).await?;
        Ok(())
    }

    async fn owned(&self, user_id: &str, id: &str) -> Result<Comment> {
        let comment = self.store.get::<Comment>(id).await?;
        if comment.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(comment)
    }
}

fn validate_content(content: &str) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Comment is empty".to_string()));
    }
    if trimmed.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::InvalidInput(format!(
            "Comment exceeds {} characters",
            MAX_COMMENT_LEN
        )));
    }
    Ok(trimmed.to_string())
}
