use common::{error::Res, session::RequestContext};
use db::store::Store;

use crate::dtos::company_update::CompanyUpdateResponse;

/// News items for every company the session customer tracks, newest first.
pub async fn get_company_updates<S: Store>(
    store: &S,
    ctx: &RequestContext,
) -> Res<Vec<CompanyUpdateResponse>> {
    let customer_uid = ctx.current_customer_uid()?;
    let mut repo = store.clone();
    let updates = repo.list_company_updates_by_customer(customer_uid).await?;

    Ok(updates.into_iter().map(CompanyUpdateResponse::from).collect())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use common::error::AppError;
    use db::memory::MemoryStore;

    use super::*;
    use crate::{
        dtos::tracked_company::TrackedCompanyInput,
        services::tracked_company::create_tracked_companies, testing::tenant,
    };

    #[actix_web::test]
    async fn lists_updates_of_own_tracked_companies() {
        let store = MemoryStore::new();
        let (acme, _, _) = tenant(&store, "jane@acme.io").await;
        let (globex, _, _) = tenant(&store, "hank@globex.io").await;
        let tracked = create_tracked_companies(
            &store,
            &acme,
            vec![TrackedCompanyInput {
                name: "Initech".to_string(),
                domain: "initech.com".to_string(),
                company_type: "competitor".to_string(),
                interests: vec![],
            }],
        )
        .await
        .unwrap();
        let company_uid = tracked[0].tracked_company_uid;
        store
            .record_company_update(company_uid, "Series B", Utc::now() - Duration::days(1))
            .unwrap();
        store
            .record_company_update(company_uid, "New CEO", Utc::now())
            .unwrap();

        let updates = get_company_updates(&store, &acme).await.unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].title, "New CEO");
        assert_eq!(updates[0].domain, "initech.com");
        assert_eq!(updates[0].tracked_company_uid, company_uid);

        assert!(get_company_updates(&store, &globex).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn requires_a_session() {
        let store = MemoryStore::new();
        assert!(matches!(
            get_company_updates(&store, &RequestContext::anonymous()).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
