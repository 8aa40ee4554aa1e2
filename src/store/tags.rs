use crate::error::Result;
use crate::models::NewTag;
use crate::services::MarklyApi;

use super::Lookups;

/// Resolve a free-text tag name to a tag ID, creating the tag if needed.
///
/// Returns `Ok(None)` for blank names and for failed creates; the caller must
/// not attach an unresolved tag. An expired session is still an error.
pub async fn resolve_tag<A>(lookups: &mut Lookups, api: &A, name: &str) -> Result<Option<String>>
where
    A: MarklyApi + ?Sized,
{
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }

    if let Some(existing) = lookups.tag_by_name(name) {
        return Ok(Some(existing.id.clone()));
    }

    let request = NewTag {
        name: name.to_string(),
    };
    match api.create_tag(&request).await {
        Ok(tag) => {
            tracing::info!("Created tag {:?} ({})", tag.name, tag.id);
            let id = tag.id.clone();
            lookups.tags.push(tag);
            Ok(Some(id))
        }
        Err(e) if e.is_unauthorized() => Err(e),
        Err(e) => {
            tracing::error!("Failed to create tag {:?}: {}", name, e);
            Ok(None)
        }
    }
}

/// Resolve several names in order, skipping failures and duplicates.
pub async fn resolve_tags<A>(lookups: &mut Lookups, api: &A, names: &[String]) -> Result<Vec<String>>
where
    A: MarklyApi + ?Sized,
{
    let mut ids: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if let Some(id) = resolve_tag(lookups, api, name).await? {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}
