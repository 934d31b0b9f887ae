use common::{error::Res, session::RequestContext};
use db::store::Store;

use crate::dtos::user::AccountUserResponse;

/// Users that belong to the session's customer.
pub async fn get_account_users<S: Store>(
    store: &S,
    ctx: &RequestContext,
) -> Res<Vec<AccountUserResponse>> {
    let customer_uid = ctx.current_customer_uid()?;
    let mut repo = store.clone();
    let users = repo.list_users_by_customer(customer_uid).await?;

    Ok(users.into_iter().map(AccountUserResponse::from).collect())
}

#[cfg(test)]
mod tests {
    use db::memory::MemoryStore;

    use super::*;
    use crate::testing::tenant;

    #[actix_web::test]
    async fn lists_only_own_users() {
        let store = MemoryStore::new();
        tenant(&store, "other@globex.io").await;
        let (ctx, _, user) = tenant(&store, "jane@acme.io").await;

        let users = get_account_users(&store, &ctx).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_uid, user.user_uid);
    }
}
