mod args;
mod auth;
mod backend;
mod post;
mod publog;
mod render;
mod session;
mod slug;
mod time;
mod timeago;
mod user;

use std::sync::Arc;

use clap::Parser;
use cookie::Cookie;
use log::info;
use maud::Markup;
use serde::Deserialize;
use warp::http::{header, StatusCode, Uri};
use warp::{Filter, Rejection, Reply};

use args::Args;
use backend::Backend;
use publog::{AuthFailure, Error, PubLog};
use session::SessionId;

const SESSION_COOKIE: &str = "sessionid";

type Response = warp::reply::Response;

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let args = Args::parse();
    let addr = args.addr().expect("couldn't parse address");
    let secure = args.secure();

    let backend = Backend::new(args.data_dir()).await;
    let site = Arc::new(PubLog::new(backend));

    let with_site = {
        let site = Arc::clone(&site);
        warp::any().map(move || Arc::clone(&site))
    };
    let with_session = warp::cookie::optional::<String>(SESSION_COOKIE)
        .map(|cookie: Option<String>| cookie.and_then(|s| s.parse::<SessionId>().ok()));
    let with_secure = warp::any().map(move || secure);

    let home = warp::get()
        .and(warp::path::end())
        .and(with_site.clone())
        .and(with_session.clone())
        .and_then(home_page);

    let login = warp::get()
        .and(warp::path!("login"))
        .and(with_site.clone())
        .and(with_session.clone())
        .and_then(login_page);

    let cadastro = warp::get()
        .and(warp::path!("cadastro"))
        .and(with_site.clone())
        .and(with_session.clone())
        .and_then(cadastro_page);

    let publicar = warp::get()
        .and(warp::path!("publicar"))
        .and(with_site.clone())
        .and(with_session.clone())
        .and_then(publicar_page);

    let logout = warp::get()
        .and(warp::path!("deslogar"))
        .and(with_site.clone())
        .and(with_session.clone())
        .and_then(deslogar);

    let post_login = warp::post()
        .and(warp::path!("login"))
        .and(with_site.clone())
        .and(with_session.clone())
        .and(with_secure.clone())
        .and(warp::body::form())
        .and_then(do_login);

    let post_cadastro = warp::post()
        .and(warp::path!("cadastro"))
        .and(with_site.clone())
        .and(with_secure)
        .and(warp::body::form())
        .and_then(do_cadastro);

    let post_publicar = warp::post()
        .and(warp::path!("publicar"))
        .and(with_site.clone())
        .and(with_session.clone())
        .and(warp::body::form())
        .and_then(do_publicar);

    let user = warp::get()
        .and(warp::path!(String))
        .and(with_site.clone())
        .and(with_session.clone())
        .and_then(user_page);

    let post = warp::get()
        .and(warp::path!(String / String))
        .and(with_site)
        .and(with_session)
        .and_then(post_page);

    // the /:username catch-alls go last so they can't shadow literal routes
    let routes = home
        .or(login)
        .or(cadastro)
        .or(publicar)
        .or(logout)
        .or(post_login)
        .or(post_cadastro)
        .or(post_publicar)
        .or(post)
        .or(user)
        .recover(handle_rejection)
        .with(warp::log("publog"));

    info!("listening on {addr}");
    warp::serve(routes).run(addr).await;
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct RegisterForm {
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct PublishForm {
    username: String,
    title: String,
    content: String,
}

fn page(markup: Markup) -> Response {
    warp::reply::html(markup.into_string()).into_response()
}

fn redirect_home() -> Response {
    warp::redirect::found(Uri::from_static("/")).into_response()
}

fn session_cookie(session_id: &SessionId, secure: bool) -> String {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .build()
        .to_string()
}

fn clear_session_cookie() -> String {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(cookie::time::Duration::ZERO)
        .build()
        .to_string()
}

fn now() -> Result<crate::time::Timestamp, Rejection> {
    crate::time::Timestamp::now().map_err(|()| warp::reject::custom(Error::Internal))
}

async fn home_page(site: Arc<PubLog>, sid: Option<SessionId>) -> Result<Response, Rejection> {
    let identity = site.authenticate(sid);
    let logged = identity.as_ref().map(|a| a.username());

    let posts = site.feed().await.map_err(warp::reject::custom)?;

    Ok(page(render::index(logged, &posts, now()?)))
}

async fn login_page(site: Arc<PubLog>, sid: Option<SessionId>) -> Result<Response, Rejection> {
    if site.authenticate(sid).is_some() {
        return Ok(redirect_home());
    }
    Ok(page(render::login(None)))
}

async fn cadastro_page(site: Arc<PubLog>, sid: Option<SessionId>) -> Result<Response, Rejection> {
    if site.authenticate(sid).is_some() {
        return Ok(redirect_home());
    }
    Ok(page(render::cadastro(None)))
}

async fn publicar_page(site: Arc<PubLog>, sid: Option<SessionId>) -> Result<Response, Rejection> {
    match site.authenticate(sid) {
        Some(authed) => Ok(page(render::publicar(authed.username(), None))),
        None => Ok(redirect_home()),
    }
}

async fn deslogar(site: Arc<PubLog>, sid: Option<SessionId>) -> Result<Response, Rejection> {
    match site.authenticate(sid) {
        Some(authed) => {
            authed.logout().map_err(warp::reject::custom)?;

            Ok(
                warp::reply::with_header(redirect_home(), header::SET_COOKIE, clear_session_cookie())
                    .into_response(),
            )
        }
        None => Ok(redirect_home()),
    }
}

async fn do_login(
    site: Arc<PubLog>,
    sid: Option<SessionId>,
    secure: bool,
    form: LoginForm,
) -> Result<Response, Rejection> {
    match site.login(&form.email, &form.password, sid).await {
        Ok(authed) => Ok(warp::reply::with_header(
            redirect_home(),
            header::SET_COOKIE,
            session_cookie(authed.session_id(), secure),
        )
        .into_response()),

        Err(Error::Auth(AuthFailure::AlreadyAuthenticated)) => Ok(redirect_home()),

        // unknown account and wrong password render the same line
        Err(Error::Auth(_)) => Ok(page(render::login(Some("Email ou senha inválidos")))),
        Err(Error::Persistence) => Ok(page(render::login(Some("Erro ao autenticar")))),

        Err(e) => Err(warp::reject::custom(e)),
    }
}

async fn do_cadastro(
    site: Arc<PubLog>,
    secure: bool,
    form: RegisterForm,
) -> Result<Response, Rejection> {
    match site
        .register(&form.username, &form.email, &form.password)
        .await
    {
        Ok(authed) => Ok(warp::reply::with_header(
            redirect_home(),
            header::SET_COOKIE,
            session_cookie(authed.session_id(), secure),
        )
        .into_response()),

        Err(Error::Validation(msg)) => Ok(page(render::cadastro(Some(msg)))),
        Err(Error::Persistence) => Ok(page(render::cadastro(Some("Erro ao cadastrar usuário")))),

        Err(e) => Err(warp::reject::custom(e)),
    }
}

async fn do_publicar(
    site: Arc<PubLog>,
    sid: Option<SessionId>,
    form: PublishForm,
) -> Result<Response, Rejection> {
    // an anonymous publish gets the same not-found signal as an
    // ownership mismatch
    let Some(authed) = site.authenticate(sid) else {
        return Err(warp::reject::custom(Error::NotFound));
    };

    match authed
        .publish(&form.username, &form.title, &form.content)
        .await
    {
        Ok(_) => {
            let uri = Uri::try_from(format!("/{}", form.username))
                .map_err(|_| warp::reject::custom(Error::Internal))?;
            Ok(warp::redirect::found(uri).into_response())
        }

        Err(Error::Validation(msg)) => Ok(page(render::publicar(authed.username(), Some(msg)))),
        Err(Error::Persistence) => Ok(page(render::publicar(
            authed.username(),
            Some("Erro ao publicar"),
        ))),

        Err(e) => Err(warp::reject::custom(e)),
    }
}

async fn user_page(
    username: String,
    site: Arc<PubLog>,
    sid: Option<SessionId>,
) -> Result<Response, Rejection> {
    let identity = site.authenticate(sid);
    let logged = identity.as_ref().map(|a| a.username());

    let (user, posts) = site
        .user_page(&username)
        .await
        .map_err(warp::reject::custom)?;

    Ok(page(render::user(logged, &user.username, &posts, now()?)))
}

async fn post_page(
    username: String,
    slug: String,
    site: Arc<PubLog>,
    sid: Option<SessionId>,
) -> Result<Response, Rejection> {
    let identity = site.authenticate(sid);
    let logged = identity.as_ref().map(|a| a.username());

    let (_user, post) = site
        .post_page(&username, &slug)
        .await
        .map_err(warp::reject::custom)?;

    Ok(page(render::post(logged, &post, now()?)))
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(&e) = err.find::<Error>() {
        let status: StatusCode = e.into();
        Ok(warp::reply::with_status(warp::reply(), status))
    } else {
        Err(err)
    }
}
