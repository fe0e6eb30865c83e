// Route table - maps request paths to pages and back.
//
// Notes live at the root, news under `/news/`, auth pages under `/auth/`.

use crate::core::notes::is_valid_slug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    NotesHome,
    NotesList,
    NotesAdd,
    NotesSuccess,
    NotesDetail(String),
    NotesEdit(String),
    NotesDelete(String),
    NewsHome,
    NewsDetail(u64),
    CommentEdit(u64),
    CommentDelete(u64),
    Login,
    Logout,
    Signup,
}

impl Route {
    /// Resolve a request path. Query string and fragment are ignored,
    /// the trailing slash is optional.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.strip_prefix('/')?;
        let segments: Vec<&str> = path
            .strip_suffix('/')
            .unwrap_or(path)
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let route = match segments.as_slice() {
            [] => Route::NotesHome,
            ["notes"] => Route::NotesList,
            ["add"] => Route::NotesAdd,
            ["done"] => Route::NotesSuccess,
            ["note", slug] => Route::NotesDetail(Self::slug(slug)?),
            ["edit", slug] => Route::NotesEdit(Self::slug(slug)?),
            ["delete", slug] => Route::NotesDelete(Self::slug(slug)?),
            ["news"] => Route::NewsHome,
            ["news", id] => Route::NewsDetail(id.parse().ok()?),
            ["news", "edit_comment", id] => Route::CommentEdit(id.parse().ok()?),
            ["news", "delete_comment", id] => Route::CommentDelete(id.parse().ok()?),
            ["auth", "login"] => Route::Login,
            ["auth", "logout"] => Route::Logout,
            ["auth", "signup"] => Route::Signup,
            _ => return None,
        };
        Some(route)
    }

    /// Canonical path of this route.
    pub fn path(&self) -> String {
        match self {
            Route::NotesHome => "/".to_string(),
            Route::NotesList => "/notes/".to_string(),
            Route::NotesAdd => "/add/".to_string(),
            Route::NotesSuccess => "/done/".to_string(),
            Route::NotesDetail(slug) => format!("/note/{}/", slug),
            Route::NotesEdit(slug) => format!("/edit/{}/", slug),
            Route::NotesDelete(slug) => format!("/delete/{}/", slug),
            Route::NewsHome => "/news/".to_string(),
            Route::NewsDetail(id) => format!("/news/{}/", id),
            Route::CommentEdit(id) => format!("/news/edit_comment/{}/", id),
            Route::CommentDelete(id) => format!("/news/delete_comment/{}/", id),
            Route::Login => "/auth/login/".to_string(),
            Route::Logout => "/auth/logout/".to_string(),
            Route::Signup => "/auth/signup/".to_string(),
        }
    }

    fn slug(segment: &str) -> Option<String> {
        is_valid_slug(segment).then(|| segment.to_string())
    }
}

/// Where the comment section of a news page lives.
pub fn comments_anchor(news_id: u64) -> String {
    format!("{}#comments", Route::NewsDetail(news_id).path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_route_from_its_path() {
        let routes = [
            Route::NotesHome,
            Route::NotesList,
            Route::NotesAdd,
            Route::NotesSuccess,
            Route::NotesDetail("slug_the_same".to_string()),
            Route::NotesEdit("slug-1".to_string()),
            Route::NotesDelete("zagolovok".to_string()),
            Route::NewsHome,
            Route::NewsDetail(3),
            Route::CommentEdit(4),
            Route::CommentDelete(5),
            Route::Login,
            Route::Logout,
            Route::Signup,
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), Some(route.clone()), "{:?}", route);
        }
    }

    #[test]
    fn test_parse_is_lenient_about_suffixes() {
        assert_eq!(Route::parse("/notes"), Some(Route::NotesList));
        assert_eq!(Route::parse("/news/7/?page=2"), Some(Route::NewsDetail(7)));
        assert_eq!(Route::parse("/news/7/#comments"), Some(Route::NewsDetail(7)));
    }

    #[test]
    fn test_parse_rejects_unknown_paths() {
        assert_eq!(Route::parse("notes/"), None);
        assert_eq!(Route::parse("/unknown/"), None);
        assert_eq!(Route::parse("/news/abc/"), None);
        assert_eq!(Route::parse("/note/не-slug/"), None);
        assert_eq!(Route::parse("/note/a/b/"), None);
    }

    #[test]
    fn test_comments_anchor() {
        assert_eq!(comments_anchor(12), "/news/12/#comments");
    }
}
