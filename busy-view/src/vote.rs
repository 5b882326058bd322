use busy_msg::{Votable, FULL_WEIGHT};
use busy_pending::Toggle;
use busy_ref::Username;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteAction {
    Like,
    Dislike,
}

/// Percent to submit when `user` presses like or dislike on `item`.
///
/// Pressing the same direction again retracts (0); anything else applies the
/// full weight. There is no partial-weight path.
pub fn next_vote_percent<V>(item: &V, user: &Username, action: VoteAction) -> i32
where
    V: Votable + ?Sized,
{
    let current = item.vote_of(user).map(|vote| vote.percent).unwrap_or(0);

    match action {
        VoteAction::Like if current > 0 => 0,
        VoteAction::Like => FULL_WEIGHT,
        VoteAction::Dislike if current < 0 => 0,
        VoteAction::Dislike => -FULL_WEIGHT,
    }
}

/// Direction of a follow, bookmark or reblog, decided by canonical
/// membership only.
pub fn presence_toggle(is_member: bool) -> Toggle {
    if is_member {
        Toggle::Remove
    } else {
        Toggle::Add
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busy_msg::{ActiveVote, Post};
    use busy_ref::ContentId;

    fn alice() -> Username {
        "alice".parse().unwrap()
    }

    fn post_with(votes: &[(&str, i32)]) -> Post {
        votes.iter().fold(
            Post::new(ContentId(10), "bob".parse().unwrap(), "p".parse().unwrap()),
            |post, (voter, percent)| post.with_vote(ActiveVote::new(voter.parse().unwrap(), *percent)),
        )
    }

    #[test]
    fn test_like_toggle_law() {
        let mut post = post_with(&[]);
        let percent = next_vote_percent(&post, &alice(), VoteAction::Like);
        assert_eq!(percent, 10000);

        // confirmation recorded the vote
        post.active_votes.push(ActiveVote::new(alice(), percent));
        assert_eq!(next_vote_percent(&post, &alice(), VoteAction::Like), 0);
    }

    #[test]
    fn test_dislike_toggle_law() {
        let post = post_with(&[("alice", -10000)]);
        assert_eq!(next_vote_percent(&post, &alice(), VoteAction::Dislike), 0);

        let post = post_with(&[]);
        assert_eq!(next_vote_percent(&post, &alice(), VoteAction::Dislike), -10000);
    }

    #[test]
    fn test_switching_direction_applies_full_weight() {
        let liked = post_with(&[("alice", 2500)]);
        assert_eq!(next_vote_percent(&liked, &alice(), VoteAction::Dislike), -10000);

        let disliked = post_with(&[("alice", -2500)]);
        assert_eq!(next_vote_percent(&disliked, &alice(), VoteAction::Like), 10000);
    }

    #[test]
    fn test_other_voters_are_ignored() {
        let post = post_with(&[("carol", 10000)]);
        assert_eq!(next_vote_percent(&post, &alice(), VoteAction::Like), 10000);
    }

    #[test]
    fn test_zero_vote_counts_as_no_vote() {
        let post = post_with(&[("alice", 0)]);
        assert_eq!(next_vote_percent(&post, &alice(), VoteAction::Like), 10000);
        assert_eq!(next_vote_percent(&post, &alice(), VoteAction::Dislike), -10000);
    }

    #[test]
    fn test_presence_toggle() {
        assert_eq!(presence_toggle(true), Toggle::Remove);
        assert_eq!(presence_toggle(false), Toggle::Add);
    }
}
