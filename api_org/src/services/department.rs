use common::{error::Res, session::RequestContext};
use db::store::Store;

use crate::dtos::department::DepartmentResponse;

pub async fn get_departments<S: Store>(
    store: &S,
    ctx: &RequestContext,
) -> Res<Vec<DepartmentResponse>> {
    ctx.session()?;
    let mut repo = store.clone();
    let departments = repo.list_departments().await?;

    Ok(departments.into_iter().map(DepartmentResponse::from).collect())
}
