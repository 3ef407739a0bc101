//! Scripted conversation starters, grouped by topic.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Casual,
    Immigration,
    Economics,
    Healthcare,
    Education,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::Casual,
        Topic::Immigration,
        Topic::Economics,
        Topic::Healthcare,
        Topic::Education,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Casual => "casual",
            Topic::Immigration => "immigration",
            Topic::Economics => "economics",
            Topic::Healthcare => "healthcare",
            Topic::Education => "education",
        }
    }

    pub fn questions(self) -> &'static [&'static str] {
        match self {
            Topic::Casual => CASUAL,
            Topic::Immigration => IMMIGRATION,
            Topic::Economics => ECONOMICS,
            Topic::Healthcare => HEALTHCARE,
            Topic::Education => EDUCATION,
        }
    }

    /// Question for the given counter value; wraps over the whole list
    pub fn question_at(self, counter: u64) -> &'static str {
        let questions = self.questions();
        questions[(counter % questions.len() as u64) as usize]
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown prompt topic: {0}")]
pub struct UnknownTopic(pub String);

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTopic(s.to_string()))
    }
}

const CASUAL: &[&str] = &[
    "What got you interested in politics in the first place?",
    "Which issue do you think people on your side misunderstand most?",
    "Who is a public figure from the other side you respect, and why?",
    "What is a belief you held five years ago that you have since changed?",
    "Where do you usually get your news?",
    "What is one thing you hope the other person takes away from this chat?",
];

const IMMIGRATION: &[&str] = &[
    "What should the main goal of immigration policy be?",
    "How should a country decide how many immigrants to admit each year?",
    "What do you think about a path to citizenship for undocumented residents?",
    "Should skills or family ties carry more weight in admissions?",
    "How should border security be balanced against asylum obligations?",
];

const ECONOMICS: &[&str] = &[
    "Should the federal minimum wage be raised?",
    "Who should carry more of the tax burden than they do today?",
    "Is the national debt a pressing problem or an overstated one?",
    "What role should the government play in creating jobs?",
    "Do trade tariffs help or hurt workers at home?",
];

const HEALTHCARE: &[&str] = &[
    "Is healthcare a right, a service, or something in between?",
    "What would you change first about how insurance works?",
    "Should prescription drug prices be negotiated by the government?",
    "How should the costs of a public option be covered?",
    "What is the biggest barrier to care in your community?",
];

const EDUCATION: &[&str] = &[
    "Should public college tuition be free?",
    "What do you think about school choice and vouchers?",
    "How should student loan debt be handled?",
    "Who should decide what goes into school curricula?",
    "How should public schools be funded more fairly?",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topic() {
        assert_eq!("casual".parse::<Topic>(), Ok(Topic::Casual));
        assert_eq!("Healthcare".parse::<Topic>(), Ok(Topic::Healthcare));
        assert!("sports".parse::<Topic>().is_err());
    }

    #[test]
    fn test_question_rotation_reaches_last_question() {
        let topic = Topic::Economics;
        let len = topic.questions().len() as u64;

        let seen: Vec<&str> = (0..len).map(|c| topic.question_at(c)).collect();
        assert_eq!(seen, topic.questions());
        assert_eq!(topic.question_at(len), topic.questions()[0]);
    }

    #[test]
    fn test_every_topic_has_questions() {
        for topic in Topic::ALL {
            assert!(!topic.questions().is_empty(), "{topic} has no questions");
        }
    }
}
