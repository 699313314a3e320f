//! Registration followed by automatic sign-in.

use crate::account::PublicAccount;
use crate::error::RegistrationError;
use crate::registration::AccountRegistrar;
use crate::session::{BootstrapOutcome, Credentials, RedirectTargets, SessionBootstrap, SessionExchange};
use crate::validation::{RegistrationForm, RegistrationRequest};

/// The two halves of a signup. `account` is always present once registration
/// succeeded, whatever happened to `session`.
#[derive(Debug, Clone)]
pub struct SignupOutcome<S> {
    pub account: PublicAccount,
    pub session: BootstrapOutcome<S>,
}

#[derive(Debug, Clone)]
pub struct SignupFlow<R, E> {
    registrar: R,
    bootstrap: SessionBootstrap<E>,
}

impl<R, E> SignupFlow<R, E>
where
    R: AccountRegistrar,
    E: SessionExchange,
{
    pub fn new(registrar: R, exchange: E, redirects: RedirectTargets) -> Self {
        Self {
            registrar,
            bootstrap: SessionBootstrap::new(exchange, redirects),
        }
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    pub async fn submit(
        &self,
        request: RegistrationRequest,
    ) -> Result<SignupOutcome<E::Session>, RegistrationError> {
        let password = request.password.clone();
        let account = self.registrar.register_account(request).await?;

        let credentials = Credentials::new(account.email.clone(), password);
        let session = self.bootstrap.bootstrap(&credentials).await;

        Ok(SignupOutcome { account, session })
    }

    /// Same as [`submit`](Self::submit) but starting from the form with its
    /// confirmation field.
    pub async fn submit_form(
        &self,
        form: RegistrationForm,
    ) -> Result<SignupOutcome<E::Session>, RegistrationError> {
        let request = form.validate()?;
        self.submit(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_store::{MockCredentialStore, MockExchange};
    use crate::registration::RegistrationHandler;
    use crate::session::MANUAL_SIGN_IN_MESSAGE;
    use crate::validation::ValidationError;

    fn flow(
        store: &MockCredentialStore,
        exchange: MockExchange,
    ) -> SignupFlow<RegistrationHandler<MockCredentialStore>, MockExchange> {
        SignupFlow::new(
            RegistrationHandler::new(store.clone()),
            exchange,
            RedirectTargets::default(),
        )
    }

    #[tokio::test]
    async fn happy_path_signs_in_and_lands_on_root() {
        let store = MockCredentialStore::new();
        let flow = flow(&store, MockExchange::new(store.clone()));

        let outcome = flow
            .submit(RegistrationRequest::new("Ada", "ada@example.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(outcome.account.email, "ada@example.com");
        assert!(outcome.session.is_established());
        assert_eq!(outcome.session.redirect_to(), "/");
        assert_eq!(
            outcome.session.session(),
            Some(&format!("session-for-{}", outcome.account.id))
        );
    }

    #[tokio::test]
    async fn bootstrap_failure_keeps_exactly_one_account() {
        let store = MockCredentialStore::new();
        let flow = flow(&store, MockExchange::broken(store.clone()));

        let outcome = flow
            .submit(RegistrationRequest::new("Ada", "ada@example.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(
            outcome.session,
            BootstrapOutcome::SignInRequired {
                redirect_to: "/login".into(),
                message: MANUAL_SIGN_IN_MESSAGE.into(),
            }
        );
        assert_eq!(store.count().await, 1);
        assert!(store.get("ada@example.com").await.is_some());
    }

    #[tokio::test]
    async fn mixed_case_email_still_signs_in() {
        let store = MockCredentialStore::new();
        let flow = flow(&store, MockExchange::new(store.clone()));

        let outcome = flow
            .submit(RegistrationRequest::new("Ada", "Ada@Example.COM", "secret1"))
            .await
            .unwrap();

        assert!(outcome.session.is_established());
    }

    #[tokio::test]
    async fn form_mismatch_never_reaches_the_store() {
        let store = MockCredentialStore::new();
        let flow = flow(&store, MockExchange::new(store.clone()));

        let error = flow
            .submit_form(RegistrationForm {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                password: "secret1".into(),
                confirm_password: "secret2".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            RegistrationError::Validation(ValidationError::PasswordMismatch)
        ));
        assert_eq!(store.writes(), 0);
    }
}
