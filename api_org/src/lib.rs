//! Tenant-scoped organisation operations. Every service reads the customer
//! and user it acts for from the request's session.

pub mod services {
    pub mod company_update;
    pub mod customer;
    pub mod department;
    pub mod email_recipient;
    pub mod tracked_company;
    pub mod user;
}
pub mod dtos {
    pub mod company_update;
    pub mod customer;
    pub mod department;
    pub mod email_recipient;
    pub mod tracked_company;
    pub mod user;
}
