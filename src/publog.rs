use std::{fmt, result, sync::Arc};

use log::{error, info};
use warp::http;

use crate::auth;
use crate::backend::{Backend, FindError};
use crate::post::Post;
use crate::session::{Session, SessionId, SessionStore};
use crate::slug;
use crate::time::Timestamp;
use crate::user::User;

const MIN_PASSWORD_LEN: usize = 6;

pub struct PubLog {
    backend: Backend,
    sessions: SessionStore,
}

/// A workflow handle with a live session attached. Everything that needs to
/// know who is asking goes through this.
pub struct PubLogAuthed {
    site: Arc<PubLog>,
    session_id: SessionId,
    session: Session,
}

impl fmt::Debug for PubLogAuthed {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("PubLogAuthed")
            .field("session_id", &self.session_id)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AuthFailure {
    UnknownUser,
    BadPassword,
    AlreadyAuthenticated,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Validation(&'static str),
    Auth(AuthFailure),
    Persistence,
    /// Unknown user, unknown post, or an ownership mismatch. The three are
    /// deliberately indistinguishable so responses never leak whether an
    /// account exists.
    NotFound,
    Session,
    Internal,
}

pub type Result<T> = result::Result<T, Error>;

impl Into<http::StatusCode> for Error {
    fn into(self) -> http::StatusCode {
        match self {
            Self::Validation(_) => http::StatusCode::BAD_REQUEST,
            Self::Auth(_) => http::StatusCode::UNAUTHORIZED,
            Self::NotFound => http::StatusCode::NOT_FOUND,
            Self::Persistence | Self::Session | Self::Internal => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl warp::reject::Reject for Error {}

fn lookup_error(e: FindError) -> Error {
    match e {
        FindError::NotFound => Error::NotFound,
        FindError::Internal => Error::Persistence,
    }
}

impl PubLog {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            sessions: SessionStore::new(),
        }
    }

    /// Create an account and attach it to a fresh session (registering
    /// doubles as logging in).
    pub async fn register(
        self: &Arc<Self>,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<PubLogAuthed> {
        if username.is_empty() || email.is_empty() {
            return Err(Error::Validation("Preencha nome de usuário e email"));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(
                "A senha deve ter pelo menos 6 caracteres",
            ));
        }

        let pwhash = auth::hash_password(password).map_err(|()| Error::Internal)?;

        let user = User {
            username: username.into(),
            email: email.into(),
            pwhash,
        };

        self.backend
            .insert_user(&user)
            .await
            .map_err(|()| Error::Persistence)?;

        info!("{username} registered");
        Ok(self.attach_session(user))
    }

    /// Verify credentials and open a session. The account lookup completes
    /// before password verification begins.
    pub async fn login(
        self: &Arc<Self>,
        email: &str,
        password: &str,
        current: Option<SessionId>,
    ) -> Result<PubLogAuthed> {
        if let Some(id) = current {
            if self.sessions.get(&id).is_some() {
                return Err(Error::Auth(AuthFailure::AlreadyAuthenticated));
            }
        }

        let user = self.backend.find_user_by_email(email).await.map_err(|e| {
            if matches!(e, FindError::NotFound) {
                info!("login rejected, no account for that email");
                Error::Auth(AuthFailure::UnknownUser)
            } else {
                Error::Persistence
            }
        })?;

        if !auth::verify_password(password, &user.pwhash) {
            info!("login rejected, wrong password for {}", user.username);
            return Err(Error::Auth(AuthFailure::BadPassword));
        }

        info!("{} logged in", user.username);
        Ok(self.attach_session(user))
    }

    fn attach_session(self: &Arc<Self>, user: User) -> PubLogAuthed {
        let session = Session {
            user: user.email,
            name: user.username,
        };
        let session_id = self.sessions.create(session.clone());

        PubLogAuthed {
            site: Arc::clone(self),
            session_id,
            session,
        }
    }

    /// Resolve a session cookie to an identity. Pure session-table read; the
    /// user record is not re-checked per request.
    pub fn authenticate(self: &Arc<Self>, session_id: Option<SessionId>) -> Option<PubLogAuthed> {
        let session_id = session_id?;
        let session = self.sessions.get(&session_id)?;

        Some(PubLogAuthed {
            site: Arc::clone(self),
            session_id,
            session,
        })
    }

    pub async fn feed(&self) -> Result<Vec<Post>> {
        self.backend.all_posts().await.map_err(|()| Error::Persistence)
    }

    pub async fn user_page(&self, username: &str) -> Result<(User, Vec<Post>)> {
        let user = self
            .backend
            .find_user(username)
            .await
            .map_err(lookup_error)?;

        let posts = self
            .backend
            .posts_for_user(username)
            .await
            .map_err(|()| Error::Persistence)?;

        Ok((user, posts))
    }

    pub async fn post_page(&self, username: &str, slug: &str) -> Result<(User, Post)> {
        let user = self
            .backend
            .find_user(username)
            .await
            .map_err(lookup_error)?;

        let post = self
            .backend
            .find_post(username, slug)
            .await
            .map_err(lookup_error)?;

        Ok((user, post))
    }
}

impl PubLogAuthed {
    pub fn username(&self) -> &str {
        &self.session.name
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn logout(&self) -> Result<()> {
        self.site
            .sessions
            .destroy(&self.session_id)
            .then(|| info!("{} logged out", self.username()))
            .ok_or(Error::Session)
    }

    /// Publish a post as `username`. The target account must exist and its
    /// email must match this session's identity; a mismatch is reported
    /// exactly like a missing user.
    pub async fn publish(&self, username: &str, title: &str, content: &str) -> Result<Post> {
        if title.trim().is_empty() || content.is_empty() {
            return Err(Error::Validation("Título e conteúdo são obrigatórios"));
        }

        let target = self
            .site
            .backend
            .find_user(username)
            .await
            .map_err(lookup_error)?;

        if target.email != self.session.user {
            error!(
                "publish rejected: session for {} tried to post as {username}",
                self.session.name,
            );
            return Err(Error::NotFound);
        }

        let post = Post {
            username: username.into(),
            title: slug::encode(title),
            content: content.into(),
            date: Timestamp::now().map_err(|()| Error::Internal)?,
        };

        self.site
            .backend
            .insert_post(&post)
            .await
            .map_err(|()| Error::Persistence)?;

        info!("{username} published {}", post.title);
        Ok(post)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::backend;

    async fn create_site() -> Arc<PubLog> {
        Arc::new(PubLog::new(backend::test::create_backend().await))
    }

    async fn register(site: &Arc<PubLog>, username: &str) -> PubLogAuthed {
        site.register(username, &format!("{username}@example.com"), "letmein")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn register_then_login() {
        let site = create_site().await;

        let authed = site
            .register("ana", "ana@example.com", "s3gredo")
            .await
            .unwrap();
        assert_eq!(authed.username(), "ana");

        let authed = site.login("ana@example.com", "s3gredo", None).await.unwrap();
        assert_eq!(authed.username(), "ana");
    }

    #[tokio::test]
    async fn short_passwords_create_no_account() {
        let site = create_site().await;

        let err = site
            .register("ana", "ana@example.com", "12345")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // nothing was persisted, so the login sees an unknown user
        let err = site.login("ana@example.com", "12345", None).await.unwrap_err();
        assert_eq!(err, Error::Auth(AuthFailure::UnknownUser));
    }

    #[tokio::test]
    async fn wrong_password_is_distinguished_internally() {
        let site = create_site().await;
        register(&site, "ana").await;

        let err = site
            .login("ana@example.com", "wrong password", None)
            .await
            .unwrap_err();
        assert_eq!(err, Error::Auth(AuthFailure::BadPassword));
    }

    #[tokio::test]
    async fn duplicate_usernames_are_a_persistence_error() {
        let site = create_site().await;
        register(&site, "ana").await;

        let err = site
            .register("ana", "other@example.com", "letmein")
            .await
            .unwrap_err();
        assert_eq!(err, Error::Persistence);
    }

    #[tokio::test]
    async fn login_with_a_live_session_is_rejected_up_front() {
        let site = create_site().await;
        let authed = register(&site, "ana").await;

        let err = site
            .login("ana@example.com", "letmein", Some(*authed.session_id()))
            .await
            .unwrap_err();
        assert_eq!(err, Error::Auth(AuthFailure::AlreadyAuthenticated));
    }

    #[tokio::test]
    async fn publish_then_fetch_by_slug() {
        let site = create_site().await;
        let authed = register(&site, "ana").await;

        authed
            .publish("ana", "my first post", "hello")
            .await
            .unwrap();

        let (user, post) = site.post_page("ana", "my-first-post").await.unwrap();
        assert_eq!(user.username, "ana");
        assert_eq!(post.content, "hello");
        assert_eq!(post.display_title(), "my first post");
    }

    #[tokio::test]
    async fn colliding_slugs_return_the_first_stored_post() {
        let site = create_site().await;
        let authed = register(&site, "ana").await;

        authed.publish("ana", "a b", "first").await.unwrap();
        authed.publish("ana", "a-b", "second").await.unwrap();

        let (_, post) = site.post_page("ana", "a-b").await.unwrap();
        assert_eq!(post.content, "first");

        // both are stored; only addressing collides
        let (_, posts) = site.user_page("ana").await.unwrap();
        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn publishing_as_someone_else_reads_as_not_found() {
        let site = create_site().await;
        let _bruno = register(&site, "bruno").await;
        let ana = register(&site, "ana").await;

        let err = ana.publish("bruno", "hijack", "hello").await.unwrap_err();
        assert_eq!(err, Error::NotFound);

        // same signal as a user that does not exist at all
        let err = ana.publish("nobody", "hijack", "hello").await.unwrap_err();
        assert_eq!(err, Error::NotFound);

        let (_, posts) = site.user_page("bruno").await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn feed_keeps_insertion_order() {
        let site = create_site().await;
        let authed = register(&site, "ana").await;

        authed.publish("ana", "one", "1").await.unwrap();
        authed.publish("ana", "two", "2").await.unwrap();
        authed.publish("ana", "three", "3").await.unwrap();

        let titles: Vec<_> = site
            .feed()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn logout_destroys_the_session() {
        let site = create_site().await;
        let authed = register(&site, "ana").await;
        let session_id = *authed.session_id();

        assert!(site.authenticate(Some(session_id)).is_some());

        authed.logout().unwrap();
        assert!(site.authenticate(Some(session_id)).is_none());

        // a second destroy has nothing to confirm
        assert_eq!(authed.logout().unwrap_err(), Error::Session);
    }

    #[tokio::test]
    async fn unknown_users_and_posts_are_not_found() {
        let site = create_site().await;
        register(&site, "ana").await;

        assert_eq!(site.user_page("bruno").await.unwrap_err(), Error::NotFound);
        assert_eq!(
            site.post_page("ana", "no-such-post").await.unwrap_err(),
            Error::NotFound
        );
    }
}
