use tracing::debug;

use crate::deck::{resolve_item, DeckIndexStore, DeckKey};
use crate::post::{Post, Timestamp};

/// Interactive areas of a card, as seen from a click target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Body,
    Button,
    ActionControls,
    Media,
    AuthorHeader,
    ReplyComposer,
    ThreadView,
}

impl Region {
    /// Regions whose clicks never reach the card.
    pub const EXCLUDED: [Region; 6] = [
        Region::Button,
        Region::ActionControls,
        Region::Media,
        Region::AuthorHeader,
        Region::ReplyComposer,
        Region::ThreadView,
    ];

    pub fn suppresses_card_click(self) -> bool {
        Region::EXCLUDED.contains(&self)
    }
}

/// Regions enclosing a click, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickTarget {
    path: Vec<Region>,
}

impl ClickTarget {
    pub fn new(path: impl IntoIterator<Item = Region>) -> Self {
        Self {
            path: path.into_iter().collect(),
        }
    }

    pub fn body() -> Self {
        Self::new([Region::Body])
    }

    /// Nearest enclosing region matching `pred`.
    pub fn closest(&self, pred: impl Fn(Region) -> bool) -> Option<Region> {
        self.path.iter().copied().find(|region| pred(*region))
    }

    pub fn within(&self, region: Region) -> bool {
        self.path.contains(&region)
    }
}

pub fn is_card_click(target: &ClickTarget) -> bool {
    target.closest(Region::suppresses_card_click).is_none()
}

/// The two layouts differ in which card regions carry their own handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Feed,
    Timeline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardAction<'a> {
    OpenPost(&'a Post),
    OpenProfile(String),
    ExpandMedia(&'a Post),
    Ignored,
}

/// The post a deck currently shows, with its display position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card<'a> {
    pub deck: DeckKey,
    pub post: &'a Post,
    pub index: usize,
    pub total: usize,
}

impl Card<'_> {
    pub fn position_label(&self) -> String {
        format!("{}/{}", self.index + 1, self.total)
    }
}

pub fn resolve_card<'a>(store: &DeckIndexStore, deck: &DeckKey, posts: &'a [Post]) -> Option<Card<'a>> {
    resolve_item(posts, store.get(deck)).map(|(index, post)| Card {
        deck: deck.clone(),
        post,
        index,
        total: posts.len(),
    })
}

/// Capabilities a presentation layer lends to the river views.
pub trait RiverHost {
    type Output;

    fn render_post_actions(&self, post: &Post, compact: bool) -> Self::Output;
    fn render_comment_section(&self, post: &Post) -> Self::Output;
    fn format_date(&self, timestamp: Timestamp) -> String;
    fn navigate(&mut self, path: &str);
    fn on_card_click(&mut self, post: &Post);
    fn expand_media(&mut self, _post: &Post) {}
}

/// Decides what a click on `card` does. The feed's author header links to
/// the profile and the timeline's media region expands the media; any
/// other excluded region swallows the click.
pub fn route_click<'a>(
    surface: Surface,
    target: &ClickTarget,
    card: &Card<'a>,
    profile_path: Option<&str>,
) -> CardAction<'a> {
    match target.closest(Region::suppresses_card_click) {
        None => CardAction::OpenPost(card.post),
        Some(Region::AuthorHeader) if surface == Surface::Feed => match profile_path {
            Some(path) => CardAction::OpenProfile(path.to_string()),
            None => CardAction::Ignored,
        },
        Some(Region::Media) if surface == Surface::Timeline => CardAction::ExpandMedia(card.post),
        Some(_) => CardAction::Ignored,
    }
}

pub fn dispatch_click<'a, H: RiverHost>(
    host: &mut H,
    surface: Surface,
    target: &ClickTarget,
    card: &Card<'a>,
    profile_path: Option<&str>,
) -> CardAction<'a> {
    let action = route_click(surface, target, card, profile_path);
    match &action {
        CardAction::OpenPost(post) => host.on_card_click(post),
        CardAction::OpenProfile(path) => host.navigate(path),
        CardAction::ExpandMedia(post) => host.expand_media(post),
        CardAction::Ignored => debug!(deck = %card.deck, "card click suppressed"),
    }
    action
}
