use comment_engine::{Comment, CommentSession, EntityRef, Rating, Result};
use serde_json::{Value, json};

pub fn render_rating(rating: &Rating) -> Value {
    json!({
        "average": rating.average,
        "label": rating.average_label(),
        "stars": rating.star_display(),
        "total_count": rating.total_count,
        "user_rating": rating.user_rating,
        "user_stars": rating.user_stars(),
        "distribution": rating.distribution,
    })
}

/// The page as the view draws it: rating header, then comments in the
/// session's sort order with their replies flattened to indent levels.
pub fn render_page(session: &CommentSession) -> Result<Value> {
    let comments = session
        .sorted_comments()
        .into_iter()
        .map(|comment| render_comment(session, comment))
        .collect::<Result<Vec<_>>>()?;
    Ok(json!({
        "event_id": session.event_id(),
        "sort": session.sort_mode(),
        "rating": render_rating(session.rating()),
        "comments": comments,
    }))
}

fn render_comment(session: &CommentSession, comment: &Comment) -> Result<Value> {
    let mut replies = Vec::new();
    for (depth, reply) in session.replies_for_display(comment.id)? {
        let age = session.age_of(EntityRef::Reply {
            comment: comment.id,
            reply: reply.id,
        })?;
        replies.push(json!({
            "id": reply.id,
            "depth": depth,
            "author": reply.author_name,
            "content": reply.display_content(),
            "likes": reply.reaction.count,
            "liked": reply.reaction.liked,
            "disliked": reply.reaction.disliked,
            "age": age.to_string(),
        }));
    }
    Ok(json!({
        "id": comment.id,
        "author": comment.author_name,
        "rating_given": comment.rating_given,
        "content": comment.content,
        "likes": comment.reaction.count,
        "liked": comment.reaction.liked,
        "disliked": comment.reaction.disliked,
        "reply_count": comment.reply_count(),
        "age": session.age_of(comment.entity())?.to_string(),
        "replies": replies,
    }))
}
