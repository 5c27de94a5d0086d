//! Service wiring shared by every handler.

use std::sync::Arc;

use orgdesk_auth::Hs256TokenCodec;
use orgdesk_infra::{CounterSequenceGenerator, CredentialStore, SequenceGenerator};
use orgdesk_services::{AuthService, BillingService, MemberService, NumberingService, Provisioner};

pub struct AppServices {
    pub codec: Arc<Hs256TokenCodec>,
    pub auth: AuthService,
    pub provisioner: Provisioner,
    pub billing: BillingService,
    pub numbering: NumberingService,
    pub members: MemberService,
}

impl AppServices {
    pub fn new(store: Arc<dyn CredentialStore>, codec: Arc<Hs256TokenCodec>) -> Self {
        let generator: Arc<dyn SequenceGenerator> = Arc::new(CounterSequenceGenerator::default());

        Self {
            auth: AuthService::new(store.clone(), codec.clone()),
            provisioner: Provisioner::new(store.clone()),
            billing: BillingService::new(store.clone(), generator.clone()),
            numbering: NumberingService::new(store.clone(), generator),
            members: MemberService::new(store),
            codec,
        }
    }
}
