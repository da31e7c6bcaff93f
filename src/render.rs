//! Server-rendered pages.
//!
//! All markup goes through maud, so every dynamic value is escaped. Styling
//! is inlined into each page; there is no static asset route.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::post::Post;
use crate::time::Timestamp;
use crate::timeago;

const SITE: &str = "publog";

const PAGE_CSS: &str = "
body { max-width: 42rem; margin: 2rem auto; padding: 0 1rem;
       font-family: system-ui, sans-serif; color: #222; }
header { display: flex; justify-content: space-between; align-items: baseline;
         border-bottom: 1px solid #ddd; padding-bottom: .5rem; }
header .brand { font-weight: bold; text-decoration: none; color: #222; }
header nav a { margin-left: .75rem; }
article.post { margin: 1.5rem 0; }
article.post h2 { margin-bottom: .25rem; }
article.post .meta, p.meta { color: #777; font-size: .85rem; }
form { display: grid; gap: .5rem; max-width: 24rem; margin-top: 1rem; }
textarea { min-height: 10rem; }
p.error { color: #b00; }
";

fn layout(title: &str, logged: Option<&str>, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="pt-BR" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                header {
                    a class="brand" href="/" { (SITE) }
                    nav {
                        @match logged {
                            Some(name) => {
                                a href={ "/" (name) } { (name) }
                                a href="/publicar" { "Publicar" }
                                a href="/deslogar" { "Sair" }
                            }
                            None => {
                                a href="/login" { "Entrar" }
                                a href="/cadastro" { "Cadastro" }
                            }
                        }
                    }
                }
                main { (body) }
            }
        }
    }
}

fn error_line(error: Option<&str>) -> Markup {
    html! {
        @if let Some(error) = error {
            p class="error" { (error) }
        }
    }
}

fn post_entry(post: &Post, now: Timestamp) -> Markup {
    html! {
        article class="post" {
            h2 {
                a href={ "/" (post.username) "/" (post.title) } {
                    (post.display_title())
                }
            }
            p class="meta" {
                a href={ "/" (post.username) } { (post.username) }
                " · "
                (timeago::time_since(post.date, now))
            }
        }
    }
}

pub fn index(logged: Option<&str>, posts: &[Post], now: Timestamp) -> Markup {
    layout(
        &format!("{SITE} - Home"),
        logged,
        html! {
            @if posts.is_empty() {
                p { "Nenhuma publicação ainda." }
            }
            @for post in posts {
                (post_entry(post, now))
            }
        },
    )
}

pub fn login(error: Option<&str>) -> Markup {
    layout(
        &format!("{SITE} - Login"),
        None,
        html! {
            h1 { "Entrar" }
            (error_line(error))
            form method="post" action="/login" {
                input type="email" name="email" placeholder="Email" required;
                input type="password" name="password" placeholder="Senha" required;
                button type="submit" { "Entrar" }
            }
            p { "Não tem conta? " a href="/cadastro" { "Cadastre-se" } }
        },
    )
}

pub fn cadastro(error: Option<&str>) -> Markup {
    layout(
        &format!("{SITE} - Cadastro"),
        None,
        html! {
            h1 { "Cadastro" }
            (error_line(error))
            form method="post" action="/cadastro" {
                input type="text" name="username" placeholder="Nome de usuário" required;
                input type="email" name="email" placeholder="Email" required;
                input type="password" name="password" placeholder="Senha" required;
                button type="submit" { "Cadastrar" }
            }
            p { "Já tem conta? " a href="/login" { "Entrar" } }
        },
    )
}

pub fn publicar(logged: &str, error: Option<&str>) -> Markup {
    layout(
        &format!("{SITE} - Publicar"),
        Some(logged),
        html! {
            h1 { "Publicar" }
            (error_line(error))
            form method="post" action="/publicar" {
                input type="hidden" name="username" value=(logged);
                input type="text" name="title" placeholder="Título" required;
                textarea name="content" placeholder="Conteúdo" required {}
                button type="submit" { "Publicar" }
            }
        },
    )
}

pub fn user(logged: Option<&str>, username: &str, posts: &[Post], now: Timestamp) -> Markup {
    layout(
        &format!("{SITE} - {username}"),
        logged,
        html! {
            h1 { (username) }
            @if posts.is_empty() {
                p { "Nenhuma publicação ainda." }
            }
            @for post in posts {
                (post_entry(post, now))
            }
        },
    )
}

pub fn post(logged: Option<&str>, post: &Post, now: Timestamp) -> Markup {
    layout(
        &format!("{SITE} - {}", post.username),
        logged,
        html! {
            article class="post" {
                h1 { (post.display_title()) }
                p class="meta" {
                    a href={ "/" (post.username) } { (post.username) }
                    " · "
                    (timeago::time_since(post.date, now))
                }
                p { (post.content) }
            }
        },
    )
}
