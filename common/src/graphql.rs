//! GraphQL-over-HTTP envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    pub operation_name: Option<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// Every operation the endpoint serves. The kind is fixed per operation so
/// access decisions never depend on the submitted document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Signup,
    VerifyCustomer,
    GetCustomer,
    UpdateCustomerAndUser,
    GetAccountUsers,
    GetDepartments,
    InviteEmailRecipient,
    ValidateInvite,
    CreateEmailRecipient,
    GetAllEmailRecipients,
    GetEmailRecipientsByDepartment,
    UpdateEmailRecipient,
    DeleteEmailRecipient,
    CreateTrackedCompany,
    GetTrackedCompanies,
    UpdateTrackedCompany,
    DeleteTrackedCompany,
    GetCompanyUpdates,
}

impl Operation {
    pub const ALL: [Operation; 18] = [
        Operation::Signup,
        Operation::VerifyCustomer,
        Operation::GetCustomer,
        Operation::UpdateCustomerAndUser,
        Operation::GetAccountUsers,
        Operation::GetDepartments,
        Operation::InviteEmailRecipient,
        Operation::ValidateInvite,
        Operation::CreateEmailRecipient,
        Operation::GetAllEmailRecipients,
        Operation::GetEmailRecipientsByDepartment,
        Operation::UpdateEmailRecipient,
        Operation::DeleteEmailRecipient,
        Operation::CreateTrackedCompany,
        Operation::GetTrackedCompanies,
        Operation::UpdateTrackedCompany,
        Operation::DeleteTrackedCompany,
        Operation::GetCompanyUpdates,
    ];

    /// Name of the field the operation resolves, used as the response key
    /// and as the error path.
    pub fn root_field(self) -> &'static str {
        match self {
            Operation::Signup => "signup",
            Operation::VerifyCustomer => "verifyCustomer",
            Operation::GetCustomer => "getCustomer",
            Operation::UpdateCustomerAndUser => "updateCustomerAndUser",
            Operation::GetAccountUsers => "getAccountUsers",
            Operation::GetDepartments => "getDepartments",
            Operation::InviteEmailRecipient => "inviteEmailRecipient",
            Operation::ValidateInvite => "validateInvite",
            Operation::CreateEmailRecipient => "createEmailRecipient",
            Operation::GetAllEmailRecipients => "getAllEmailRecipients",
            Operation::GetEmailRecipientsByDepartment => "getEmailRecipientsByDepartment",
            Operation::UpdateEmailRecipient => "updateEmailRecipient",
            Operation::DeleteEmailRecipient => "deleteEmailRecipient",
            Operation::CreateTrackedCompany => "createTrackedCompany",
            Operation::GetTrackedCompanies => "getTrackedCompanies",
            Operation::UpdateTrackedCompany => "updateTrackedCompany",
            Operation::DeleteTrackedCompany => "deleteTrackedCompany",
            Operation::GetCompanyUpdates => "getCompanyUpdates",
        }
    }

    pub fn kind(self) -> OperationKind {
        match self {
            Operation::GetCustomer
            | Operation::GetAccountUsers
            | Operation::GetDepartments
            | Operation::ValidateInvite
            | Operation::GetAllEmailRecipients
            | Operation::GetEmailRecipientsByDepartment
            | Operation::GetTrackedCompanies
            | Operation::GetCompanyUpdates => OperationKind::Query,
            Operation::Signup
            | Operation::VerifyCustomer
            | Operation::UpdateCustomerAndUser
            | Operation::InviteEmailRecipient
            | Operation::CreateEmailRecipient
            | Operation::UpdateEmailRecipient
            | Operation::DeleteEmailRecipient
            | Operation::CreateTrackedCompany
            | Operation::UpdateTrackedCompany
            | Operation::DeleteTrackedCompany => OperationKind::Mutation,
        }
    }

    /// Client operation names differ from the root field only in case
    /// (`Signup` / `signup`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.root_field().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLErrorEntry {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLErrorEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(Operation::from_name("Signup"), Some(Operation::Signup));
        assert_eq!(Operation::from_name("SIGNUP"), Some(Operation::Signup));
        assert_eq!(
            Operation::from_name("VerifyCustomer"),
            Some(Operation::VerifyCustomer)
        );
        assert_eq!(Operation::from_name("dropTables"), None);
    }

    #[test]
    fn every_operation_round_trips_through_its_root_field() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.root_field()), Some(op));
        }
    }

    #[test]
    fn kinds_follow_the_operation_not_the_document() {
        assert_eq!(Operation::DeleteTrackedCompany.kind(), OperationKind::Mutation);
        assert_eq!(Operation::UpdateEmailRecipient.kind(), OperationKind::Mutation);
        assert_eq!(Operation::GetCompanyUpdates.kind(), OperationKind::Query);
        assert_eq!(Operation::ValidateInvite.kind(), OperationKind::Query);
    }

    #[test]
    fn request_parses_apollo_body() {
        let request: GraphQLRequest = serde_json::from_value(serde_json::json!({
            "operationName": "signup",
            "query": "mutation signup($input: SignupInput!) { signup(input: $input) { userId } }",
            "variables": { "input": { "email": "a@b.io", "password": "pw" } }
        }))
        .unwrap();
        assert_eq!(request.operation_name.as_deref(), Some("signup"));
        assert!(request.variables.contains_key("input"));
    }
}
