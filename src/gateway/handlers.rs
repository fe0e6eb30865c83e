// Request dispatcher - turns an inbound request into a classified response.
//
// The gateway owns no rules of its own: it resolves the route, calls the
// matching service operation and maps the `Outcome` to a response.

use super::routes::{comments_anchor, Route};
use crate::core::access::{decide, login_redirect, Action, Actor, Decision, FormErrors, Outcome};
use crate::core::news::{Comment, CommentForm, News, NewsError, NewsService, NewsStore};
use crate::core::notes::{Note, NoteError, NoteForm, NoteStore, NotesService};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Notes(#[from] NoteError),

    #[error(transparent)]
    News(#[from] NewsError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Delete,
}

/// One inbound request. `user` comes from the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub user: Option<u64>,
    #[serde(default)]
    pub method: Method,
    pub path: String,
    #[serde(default)]
    pub form: BTreeMap<String, String>,
}

#[cfg(test)]
impl Request {
    pub fn get(user: Option<u64>, path: impl Into<String>) -> Self {
        Self {
            user,
            method: Method::Get,
            path: path.into(),
            form: BTreeMap::new(),
        }
    }

    pub fn post(user: Option<u64>, path: impl Into<String>, form: &[(&str, &str)]) -> Self {
        Self {
            user,
            method: Method::Post,
            path: path.into(),
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn delete(user: Option<u64>, path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            ..Self::get(user, path)
        }
    }
}

impl Request {
    fn field(&self, name: &str) -> String {
        self.form.get(name).cloned().unwrap_or_default()
    }

    fn note_form(&self) -> NoteForm {
        let form = NoteForm::new(self.field("title"), self.field("text"));
        match self.form.get("slug") {
            Some(slug) => form.with_slug(slug.as_str()),
            None => form,
        }
    }

    fn comment_form(&self) -> CommentForm {
        CommentForm::new(self.field("text"))
    }
}

/// Rendered page content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Page {
    NotesHome,
    NoteList { notes: Vec<Note> },
    /// Add form when `note` is empty, edit form otherwise
    NoteForm { note: Option<Note> },
    NoteDetail { note: Note },
    NoteDelete { note: Note },
    NoteSuccess,
    NewsHome { news: Vec<News> },
    NewsDetail {
        news: News,
        comments: Vec<Comment>,
        /// Only logged in users get the comment form
        comment_form: bool,
    },
    CommentEdit { comment: Comment },
    CommentDelete { comment: Comment },
    Auth { name: String },
}

/// Classified response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok { page: Page },
    NotFound,
    RedirectLogin { location: String },
    Redirect { location: String },
    /// Form rejected; the submitted input is echoed back for re-editing
    Invalid {
        errors: FormErrors,
        form: BTreeMap<String, String>,
    },
    Error { message: String },
}

impl Response {
    fn page(page: Page) -> Self {
        Response::Ok { page }
    }

    fn redirect(location: impl Into<String>) -> Self {
        Response::Redirect {
            location: location.into(),
        }
    }
}

pub struct Gateway<N: NoteStore, W: NewsStore> {
    notes: Arc<NotesService<N>>,
    news: Arc<NewsService<W>>,
    login_url: String,
}

impl<N: NoteStore, W: NewsStore> Gateway<N, W> {
    pub fn new(
        notes: Arc<NotesService<N>>,
        news: Arc<NewsService<W>>,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            notes,
            news,
            login_url: login_url.into(),
        }
    }

    pub async fn handle(&self, request: &Request) -> Response {
        let Some(route) = Route::parse(&request.path) else {
            tracing::debug!(path = %request.path, "No route");
            return Response::NotFound;
        };
        let actor = Actor::from_user(request.user);
        tracing::debug!(?route, method = ?request.method, user = ?request.user, "Dispatching");

        match self.dispatch(&actor, &route, request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(?route, "Request failed: {}", e);
                Response::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn dispatch(
        &self,
        actor: &Actor,
        route: &Route,
        request: &Request,
    ) -> Result<Response, GatewayError> {
        use Method::{Delete, Get, Post};

        let response = match (route, request.method) {
            (Route::NotesHome, Get) => {
                self.respond(request, browse(actor, Page::NotesHome), Response::page)
            }
            (Route::Login | Route::Logout | Route::Signup, Get | Post) => {
                let name = route.path().trim_matches('/').replace("auth/", "");
                self.respond(request, browse(actor, Page::Auth { name }), Response::page)
            }

            // ---- notes ----
            (Route::NotesList, Get) => {
                let outcome = self.notes.list(actor).await?;
                self.respond(request, outcome, |notes| {
                    Response::page(Page::NoteList { notes })
                })
            }
            (Route::NotesSuccess, Get) => {
                let outcome = self.notes.require_login(actor);
                self.respond(request, outcome, |_| Response::page(Page::NoteSuccess))
            }
            (Route::NotesAdd, Get) => {
                let outcome = self.notes.require_login(actor);
                self.respond(request, outcome, |_| {
                    Response::page(Page::NoteForm { note: None })
                })
            }
            (Route::NotesAdd, Post) => {
                let outcome = self.notes.create(actor, &request.note_form()).await?;
                self.respond(request, outcome, |_| {
                    Response::redirect(Route::NotesSuccess.path())
                })
            }
            (Route::NotesDetail(slug), Get) => {
                let outcome = self.notes.detail(actor, slug).await?;
                self.respond(request, outcome, |note| {
                    Response::page(Page::NoteDetail { note })
                })
            }
            (Route::NotesEdit(slug), Get) => {
                let outcome = self.notes.for_edit(actor, slug).await?;
                self.respond(request, outcome, |note| {
                    Response::page(Page::NoteForm { note: Some(note) })
                })
            }
            (Route::NotesEdit(slug), Post) => {
                let outcome = self.notes.edit(actor, slug, &request.note_form()).await?;
                self.respond(request, outcome, |_| {
                    Response::redirect(Route::NotesSuccess.path())
                })
            }
            (Route::NotesDelete(slug), Get) => {
                let outcome = self.notes.for_delete(actor, slug).await?;
                self.respond(request, outcome, |note| {
                    Response::page(Page::NoteDelete { note })
                })
            }
            (Route::NotesDelete(slug), Post | Delete) => {
                let outcome = self.notes.delete(actor, slug).await?;
                self.respond(request, outcome, |_| {
                    Response::redirect(Route::NotesSuccess.path())
                })
            }

            // ---- news ----
            (Route::NewsHome, Get) => {
                let news = self.news.home().await?;
                self.respond(request, browse(actor, Page::NewsHome { news }), Response::page)
            }
            (Route::NewsDetail(id), Get) => {
                let outcome = match self.news.detail(*id).await? {
                    Outcome::Done(detail) => browse(actor, detail),
                    other => other,
                };
                let comment_form = decide(Action::Create, actor, None) == Decision::Allow;
                self.respond(request, outcome, |detail| {
                    Response::page(Page::NewsDetail {
                        news: detail.news,
                        comments: detail.comments,
                        comment_form,
                    })
                })
            }
            (Route::NewsDetail(id), Post) => {
                let outcome = self
                    .news
                    .add_comment(actor, *id, &request.comment_form())
                    .await?;
                self.respond(request, outcome, |comment| {
                    Response::redirect(comments_anchor(comment.news_id))
                })
            }
            (Route::CommentEdit(id), Get) => {
                let outcome = self.news.comment_for_edit(actor, *id).await?;
                self.respond(request, outcome, |comment| {
                    Response::page(Page::CommentEdit { comment })
                })
            }
            (Route::CommentEdit(id), Post) => {
                let outcome = self
                    .news
                    .edit_comment(actor, *id, &request.comment_form())
                    .await?;
                self.respond(request, outcome, |comment| {
                    Response::redirect(comments_anchor(comment.news_id))
                })
            }
            (Route::CommentDelete(id), Get) => {
                let outcome = self.news.comment_for_delete(actor, *id).await?;
                self.respond(request, outcome, |comment| {
                    Response::page(Page::CommentDelete { comment })
                })
            }
            (Route::CommentDelete(id), Post | Delete) => {
                let outcome = self.news.delete_comment(actor, *id).await?;
                self.respond(request, outcome, |comment| {
                    Response::redirect(comments_anchor(comment.news_id))
                })
            }

            _ => Response::NotFound,
        };

        Ok(response)
    }

    /// Map a service outcome to a response; `on_done` renders the success case.
    fn respond<T>(
        &self,
        request: &Request,
        outcome: Outcome<T>,
        on_done: impl FnOnce(T) -> Response,
    ) -> Response {
        match outcome {
            Outcome::Done(value) => on_done(value),
            Outcome::NotFound => Response::NotFound,
            Outcome::LoginRequired => Response::RedirectLogin {
                location: login_redirect(&self.login_url, &request.path),
            },
            Outcome::Rejected(errors) => Response::Invalid {
                errors,
                form: request.form.clone(),
            },
        }
    }
}

/// Public pages still go through the access controller.
fn browse<T>(actor: &Actor, page: T) -> Outcome<T> {
    Outcome::from_denial(decide(Action::Browse, actor, None)).unwrap_or(Outcome::Done(page))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{ContentFilter, BANNED_WORD_WARNING};
    use crate::core::news::NEWS_COUNT_ON_HOME_PAGE;
    use crate::infra::news::InMemoryNewsStore;
    use crate::infra::notes::InMemoryNoteStore;
    use chrono::Utc;

    const AUTHOR: Option<u64> = Some(1);
    const READER: Option<u64> = Some(2);
    const ANONYMOUS: Option<u64> = None;
    const LOGIN_URL: &str = "/auth/login/";

    type TestGateway = Gateway<InMemoryNoteStore, InMemoryNewsStore>;

    fn gateway() -> TestGateway {
        Gateway::new(
            Arc::new(NotesService::new(InMemoryNoteStore::new())),
            Arc::new(NewsService::new(
                InMemoryNewsStore::new(),
                ContentFilter::default(),
                NEWS_COUNT_ON_HOME_PAGE,
            )),
            LOGIN_URL,
        )
    }

    /// Gateway with one note by AUTHOR (slug `slug_the_same`).
    async fn with_note() -> TestGateway {
        let gateway = gateway();
        let response = gateway
            .handle(&Request::post(
                AUTHOR,
                "/add/",
                &[("title", "Заголовок"), ("text", "Текст"), ("slug", "slug_the_same")],
            ))
            .await;
        assert_eq!(response, Response::redirect("/done/"));
        gateway
    }

    /// Gateway with one news item and one comment by AUTHOR. Returns (news id, comment id).
    async fn with_comment() -> (TestGateway, u64, u64) {
        let gateway = gateway();
        let news = gateway
            .news
            .publish("Заголовок", "Текст заметки", Utc::now().date_naive())
            .await
            .unwrap();
        let comment = gateway
            .news
            .add_comment(&Actor::from_user(AUTHOR), news.id, &CommentForm::new("text"))
            .await
            .unwrap()
            .done()
            .unwrap();
        (gateway, news.id, comment.id)
    }

    fn is_ok(response: &Response) -> bool {
        matches!(response, Response::Ok { .. })
    }

    #[tokio::test]
    async fn test_home_and_auth_pages_open_to_everyone() {
        let gateway = with_note().await;
        for user in [AUTHOR, READER, ANONYMOUS] {
            for path in ["/", "/news/", "/auth/login/", "/auth/logout/", "/auth/signup/"] {
                let response = gateway.handle(&Request::get(user, path)).await;
                assert!(is_ok(&response), "{} for {:?}: {:?}", path, user, response);
            }
        }
    }

    #[tokio::test]
    async fn test_user_pages_availability() {
        let gateway = gateway();
        for path in ["/notes/", "/done/", "/add/"] {
            let response = gateway.handle(&Request::get(READER, path)).await;
            assert!(is_ok(&response), "{}: {:?}", path, response);
        }
    }

    #[tokio::test]
    async fn test_author_pages_availability() {
        let gateway = with_note().await;
        for path in [
            "/note/slug_the_same/",
            "/edit/slug_the_same/",
            "/delete/slug_the_same/",
        ] {
            assert!(is_ok(&gateway.handle(&Request::get(AUTHOR, path)).await));
            assert_eq!(
                gateway.handle(&Request::get(READER, path)).await,
                Response::NotFound
            );
        }
    }

    #[tokio::test]
    async fn test_redirect_for_anonymous_client() {
        let gateway = with_note().await;
        for path in [
            "/notes/",
            "/done/",
            "/add/",
            "/note/slug_the_same/",
            "/edit/slug_the_same/",
            "/delete/slug_the_same/",
        ] {
            assert_eq!(
                gateway.handle(&Request::get(ANONYMOUS, path)).await,
                Response::RedirectLogin {
                    location: format!("{}?next={}", LOGIN_URL, path)
                }
            );
        }
    }

    #[tokio::test]
    async fn test_login_redirect_keeps_requested_path() {
        let gateway = gateway();
        assert_eq!(
            gateway.handle(&Request::get(ANONYMOUS, "/notes?x=1")).await,
            Response::RedirectLogin {
                location: "/auth/login/?next=/notes?x=1".to_string()
            }
        );
        assert_eq!(
            gateway.handle(&Request::get(ANONYMOUS, "/add")).await,
            Response::RedirectLogin {
                location: "/auth/login/?next=/add".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_note_list_in_context_is_owner_scoped() {
        let gateway = with_note().await;
        gateway
            .handle(&Request::post(
                READER,
                "/add/",
                &[("title", "Чужая заметка"), ("text", "Текст")],
            ))
            .await;

        let Response::Ok {
            page: Page::NoteList { notes },
        } = gateway.handle(&Request::get(AUTHOR, "/notes/")).await
        else {
            panic!("expected note list");
        };
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].slug, "slug_the_same");
    }

    #[tokio::test]
    async fn test_add_and_edit_pages_contain_form() {
        let gateway = with_note().await;

        let add = gateway.handle(&Request::get(AUTHOR, "/add/")).await;
        assert_eq!(add, Response::page(Page::NoteForm { note: None }));

        let edit = gateway.handle(&Request::get(AUTHOR, "/edit/slug_the_same/")).await;
        assert!(matches!(
            edit,
            Response::Ok { page: Page::NoteForm { note: Some(ref n) } } if n.slug == "slug_the_same"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_slug_echoes_form() {
        let gateway = with_note().await;
        let request = Request::post(
            AUTHOR,
            "/add/",
            &[("title", "Заголовок"), ("text", "Текст"), ("slug", "slug_the_same")],
        );

        let Response::Invalid { errors, form } = gateway.handle(&request).await else {
            panic!("expected invalid form");
        };
        assert_eq!(
            errors.field("slug"),
            ["slug_the_same - такой slug уже существует, придумайте уникальное значение!"]
        );
        assert_eq!(form, request.form);
    }

    #[tokio::test]
    async fn test_anonymous_post_creates_nothing() {
        let gateway = gateway();
        let response = gateway
            .handle(&Request::post(
                ANONYMOUS,
                "/add/",
                &[("title", "Заголовок"), ("text", "Текст")],
            ))
            .await;
        assert_eq!(
            response,
            Response::RedirectLogin {
                location: "/auth/login/?next=/add/".to_string()
            }
        );
        assert_eq!(gateway.notes.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_note_edit_and_delete_flows() {
        let gateway = with_note().await;
        let form = [("title", "Новый заголовок"), ("text", "Новый текст")];

        let response = gateway
            .handle(&Request::post(READER, "/edit/slug_the_same/", &form))
            .await;
        assert_eq!(response, Response::NotFound);

        let response = gateway
            .handle(&Request::post(AUTHOR, "/edit/slug_the_same/", &form))
            .await;
        assert_eq!(response, Response::redirect("/done/"));

        let note = gateway
            .notes
            .detail(&Actor::from_user(AUTHOR), "slug_the_same")
            .await
            .unwrap()
            .done()
            .unwrap();
        assert_eq!(note.text, "Новый текст");

        let response = gateway
            .handle(&Request::delete(READER, "/delete/slug_the_same/"))
            .await;
        assert_eq!(response, Response::NotFound);
        assert_eq!(gateway.notes.count().await.unwrap(), 1);

        let response = gateway
            .handle(&Request::delete(AUTHOR, "/delete/slug_the_same/"))
            .await;
        assert_eq!(response, Response::redirect("/done/"));
        assert_eq!(gateway.notes.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_news_detail_public_and_comment_form_for_users() {
        let (gateway, news_id, _) = with_comment().await;
        let path = format!("/news/{}/", news_id);

        let anonymous = gateway.handle(&Request::get(ANONYMOUS, &path)).await;
        assert!(matches!(
            anonymous,
            Response::Ok { page: Page::NewsDetail { comment_form: false, .. } }
        ));

        let author = gateway.handle(&Request::get(AUTHOR, &path)).await;
        assert!(matches!(
            author,
            Response::Ok { page: Page::NewsDetail { comment_form: true, ref comments, .. } } if comments.len() == 1
        ));

        assert_eq!(
            gateway.handle(&Request::get(ANONYMOUS, "/news/999/")).await,
            Response::NotFound
        );
    }

    #[tokio::test]
    async fn test_comment_submission() {
        let (gateway, news_id, _) = with_comment().await;
        let path = format!("/news/{}/", news_id);

        let response = gateway
            .handle(&Request::post(ANONYMOUS, &path, &[("text", "Новый текст")]))
            .await;
        assert_eq!(
            response,
            Response::RedirectLogin {
                location: format!("/auth/login/?next={}", path)
            }
        );

        let response = gateway
            .handle(&Request::post(AUTHOR, &path, &[("text", "Новый текст")]))
            .await;
        assert_eq!(response, Response::redirect(format!("{}#comments", path)));
        assert_eq!(gateway.news.comment_count().await.unwrap(), 2);

        let response = gateway
            .handle(&Request::post(
                AUTHOR,
                &path,
                &[("text", "Какой-то текст, редиска, еще текст")],
            ))
            .await;
        let Response::Invalid { errors, .. } = response else {
            panic!("expected invalid form");
        };
        assert_eq!(errors.field("text"), [BANNED_WORD_WARNING]);
        assert_eq!(gateway.news.comment_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_comment_edit_delete_availability() {
        let (gateway, news_id, comment_id) = with_comment().await;
        let edit = format!("/news/edit_comment/{}/", comment_id);
        let delete = format!("/news/delete_comment/{}/", comment_id);

        for path in [&edit, &delete] {
            assert!(is_ok(&gateway.handle(&Request::get(AUTHOR, path.as_str())).await));
            assert_eq!(
                gateway.handle(&Request::get(READER, path.as_str())).await,
                Response::NotFound
            );
            assert_eq!(
                gateway.handle(&Request::get(ANONYMOUS, path.as_str())).await,
                Response::RedirectLogin {
                    location: format!("/auth/login/?next={}", path)
                }
            );
        }

        let response = gateway
            .handle(&Request::post(READER, edit.as_str(), &[("text", "Новый текст")]))
            .await;
        assert_eq!(response, Response::NotFound);

        let response = gateway
            .handle(&Request::post(AUTHOR, edit.as_str(), &[("text", "Новый текст")]))
            .await;
        assert_eq!(
            response,
            Response::redirect(format!("/news/{}/#comments", news_id))
        );

        let response = gateway.handle(&Request::delete(READER, delete.as_str())).await;
        assert_eq!(response, Response::NotFound);
        assert_eq!(gateway.news.comment_count().await.unwrap(), 1);

        let response = gateway.handle(&Request::delete(AUTHOR, delete.as_str())).await;
        assert_eq!(
            response,
            Response::redirect(format!("/news/{}/#comments", news_id))
        );
        assert_eq!(gateway.news.comment_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_path_and_method() {
        let gateway = gateway();
        assert_eq!(
            gateway.handle(&Request::get(AUTHOR, "/nope/")).await,
            Response::NotFound
        );
        assert_eq!(
            gateway.handle(&Request::delete(AUTHOR, "/notes/")).await,
            Response::NotFound
        );
    }

    #[test]
    fn test_request_json_shape() {
        let request: Request = serde_json::from_str(
            r#"{"user": 1, "method": "POST", "path": "/add/", "form": {"title": "Заголовок"}}"#,
        )
        .unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.user, Some(1));
        assert_eq!(request.field("title"), "Заголовок");

        let request: Request = serde_json::from_str(r#"{"path": "/"}"#).unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.user, None);

        let json = serde_json::to_value(Response::RedirectLogin {
            location: "/auth/login/?next=/add/".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "redirect_login");
        assert_eq!(json["location"], "/auth/login/?next=/add/");
    }
}
