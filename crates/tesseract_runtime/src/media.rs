//! URL sniffing for post media and small post predicates.
//!
//! Every check is total: URLs that do not parse simply fail the checks that need a parsed path.

use platform_host::api::types::{CommentView, Person, PostView};
use url::Url;

use crate::config::YtFrontends;

const IMAGE_EXTENSIONS: [&str; 7] = ["jpeg", "jpg", "gif", "png", "svg", "bmp", "webp"];
const VIDEO_SUFFIXES: [&str; 4] = ["mp4", "webm", "mov", "m4v"];
const YOUTUBE_PREFIXES: [&str; 4] = [
    "https://youtu.be",
    "https://m.youtube.com",
    "https://www.youtube.com",
    "https://youtube.com",
];
const SPOTIFY_PREFIX: &str = "https://open.spotify.com";
const SOUNDCLOUD_PREFIXES: [&str; 2] = ["https://m.soundcloud.com", "https://soundcloud.com"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// How a post's link should be rendered.
pub enum ContentKind {
    Image,
    Video,
    /// YouTube or one of its configured front-ends.
    Youtube,
    Spotify,
    Soundcloud,
    /// Plain link without a thumbnail.
    Link,
    /// Link with a server-generated thumbnail.
    ThumbLink,
    Text,
}

impl ContentKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Youtube => "youtube",
            Self::Spotify => "spotify",
            Self::Soundcloud => "soundcloud",
            Self::Link => "link",
            Self::ThumbLink => "thumbLink",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Where a post is being rendered.
pub enum PostDisplayType {
    /// Full post page.
    Post,
    /// Entry in a feed.
    #[default]
    Feed,
}

fn path_of(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|parsed| parsed.path().to_string())
}

/// `true` when the URL path ends in a known image extension (case-insensitive).
pub fn is_image(url: &str) -> bool {
    let Some(path) = path_of(url) else {
        return false;
    };
    let Some((_, extension)) = path.rsplit_once('.') else {
        return false;
    };
    IMAGE_EXTENSIONS
        .iter()
        .any(|known| extension.eq_ignore_ascii_case(known))
}

/// `true` when the lowercased URL path ends in a video suffix.
pub fn is_video(url: &str) -> bool {
    path_of(url).is_some_and(|path| {
        let path = path.to_ascii_lowercase();
        VIDEO_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
    })
}

fn has_frontend_prefix(url: &str, hosts: &[String]) -> bool {
    hosts
        .iter()
        .any(|host| url.starts_with(&format!("https://{host}")))
}

pub fn is_youtube(url: &str) -> bool {
    YOUTUBE_PREFIXES.iter().any(|prefix| url.starts_with(prefix))
}

/// YouTube itself or a configured Invidious/Piped front-end.
pub fn is_embeddable_video(url: &str, frontends: &YtFrontends) -> bool {
    has_frontend_prefix(url, &frontends.invidious)
        || is_youtube(url)
        || has_frontend_prefix(url, &frontends.piped)
}

pub fn is_spotify(url: &str) -> bool {
    url.starts_with(SPOTIFY_PREFIX)
}

pub fn is_soundcloud(url: &str) -> bool {
    SOUNDCLOUD_PREFIXES
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

/// Classifies a post link. The order of checks is fixed: image, video, embeddable video, Spotify,
/// SoundCloud, bare link, link with thumbnail, then text.
pub fn classify(url: Option<&str>, has_thumbnail: bool, frontends: &YtFrontends) -> ContentKind {
    let Some(url) = url.filter(|url| !url.is_empty()) else {
        return ContentKind::Text;
    };

    if is_image(url) {
        ContentKind::Image
    } else if is_video(url) {
        ContentKind::Video
    } else if is_embeddable_video(url, frontends) {
        ContentKind::Youtube
    } else if is_spotify(url) {
        ContentKind::Spotify
    } else if is_soundcloud(url) {
        ContentKind::Soundcloud
    } else if !has_thumbnail {
        ContentKind::Link
    } else {
        ContentKind::ThumbLink
    }
}

/// [`classify`] applied to a post's link and thumbnail.
pub fn post_type(post: &PostView, frontends: &YtFrontends) -> ContentKind {
    let has_thumbnail = post
        .post
        .thumbnail_url
        .as_deref()
        .is_some_and(|thumbnail| !thumbnail.is_empty());
    classify(post.post.url.as_deref(), has_thumbnail, frontends)
}

/// Admins may edit local posts; everyone may edit their own.
pub fn is_mutable(post: &PostView, me: &Person) -> bool {
    (me.admin && post.post.local) || me.id == post.creator.id
}

pub fn is_comment_mutable(comment: &CommentView, me: &Person) -> bool {
    me.id == comment.creator.id
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn frontends() -> YtFrontends {
        YtFrontends {
            invidious: vec!["yewtu.be".to_string()],
            piped: vec!["piped.video".to_string()],
        }
    }

    fn post(url: Option<&str>, thumbnail: Option<&str>) -> PostView {
        let mut view = PostView::default();
        view.post.url = url.map(str::to_string);
        view.post.thumbnail_url = thumbnail.map(str::to_string);
        view
    }

    #[test]
    fn gif_with_thumbnail_is_an_image() {
        let view = post(
            Some("https://media.example.com/funny.GIF"),
            Some("https://lemmy.ml/pictrs/image/thumb.png"),
        );
        assert_eq!(post_type(&view, &frontends()), ContentKind::Image);
    }

    #[test]
    fn checks_run_in_fixed_order() {
        let yt = frontends();
        let cases = [
            ("https://i.example.com/a.webp?x=1", false, ContentKind::Image),
            ("https://v.example.com/clip.MP4", true, ContentKind::Video),
            ("https://v.example.com/clipmov", false, ContentKind::Video),
            ("https://youtu.be/abc", false, ContentKind::Youtube),
            ("https://yewtu.be/watch?v=abc", true, ContentKind::Youtube),
            ("https://piped.video/watch?v=abc", false, ContentKind::Youtube),
            ("https://open.spotify.com/track/1", false, ContentKind::Spotify),
            ("https://m.soundcloud.com/a/b", true, ContentKind::Soundcloud),
            ("https://news.example.com/story", false, ContentKind::Link),
            ("https://news.example.com/story", true, ContentKind::ThumbLink),
            // the embed check only looks at the prefix, so an image on youtube is still an image
            ("https://www.youtube.com/logo.png", false, ContentKind::Image),
        ];
        for (url, thumbnail, expected) in cases {
            assert_eq!(classify(Some(url), thumbnail, &yt), expected, "{url}");
        }
    }

    #[test]
    fn classify_is_total() {
        let yt = frontends();
        for input in [
            "",
            "not a url",
            "://broken",
            "picture.png",
            "https://",
            "\u{0}\u{ffff}",
            "data:image/png;base64,AAAA",
        ] {
            let kind = classify(Some(input), true, &yt);
            assert!(matches!(
                kind,
                ContentKind::Text | ContentKind::ThumbLink | ContentKind::Image
            ));
        }
        assert_eq!(classify(None, true, &yt), ContentKind::Text);
        assert_eq!(classify(Some("picture.png"), false, &yt), ContentKind::Link);
        assert_eq!(post_type(&post(None, None), &yt), ContentKind::Text);
    }

    #[test]
    fn unparseable_urls_never_match_extension_checks() {
        assert!(!is_image("relative/path.png"));
        assert!(!is_video("clip.mp4"));
        assert!(!is_image("https://example.com/noextension"));
    }

    #[test]
    fn mutability_follows_ownership_and_admin_rights() {
        let mut view = post(None, None);
        view.creator.id = 7;
        view.post.local = true;
        let owner = Person {
            id: 7,
            ..Person::default()
        };
        let admin = Person {
            id: 1,
            admin: true,
            ..Person::default()
        };
        let stranger = Person {
            id: 2,
            ..Person::default()
        };

        assert!(is_mutable(&view, &owner));
        assert!(is_mutable(&view, &admin));
        assert!(!is_mutable(&view, &stranger));
        view.post.local = false;
        assert!(!is_mutable(&view, &admin));

        let mut comment = CommentView::default();
        comment.creator.id = 2;
        assert!(is_comment_mutable(&comment, &stranger));
        assert!(!is_comment_mutable(&comment, &admin));
    }

    #[test]
    fn content_kind_tokens() {
        assert_eq!(ContentKind::ThumbLink.as_str(), "thumbLink");
    }
}
