use rand::seq::IndexedRandom;

/// Something that can come up with a conversation prompt for a table.
pub trait TopicSource: Send + Sync {
    fn pick(&self) -> String;
}

static TOPICS: &[&str] = &[
    "If you could invite anyone, living or dead, to dinner, who would it be and why?",
    "Would you like to be famous? If so, for what?",
    "Do you rehearse what you're going to say before making a phone call?",
    "When did you last sing to yourself?",
    "If you could live to 100 keeping either the mind or the body of a 30 year old, which would you pick?",
    "Name three things you and the person across the table have in common.",
    "What are you most grateful for?",
    "If you could change anything about how you were raised, what would it be?",
    "Tell the story of your life in three minutes.",
    "If you could wake up tomorrow with one new skill, what would it be?",
    "Is there something you've dreamed of doing for a long time?",
    "What's the biggest accomplishment of your life so far?",
    "What do you value most in a friendship?",
    "What's your most treasured memory?",
    "If you knew you had a year left, what would you change?",
    "What role does love play in your life?",
    "Take turns naming something you like about each other.",
    "Share an embarrassing moment from your life.",
    "What topic is too serious to joke about?",
    "The house is on fire. Besides people, pets, documents and money, what do you save?",
    "What happened to you for the first time this year?",
    "What does the word \"success\" mean to you?",
    "What would you tell your 15 year old self?",
    "What could you talk about for hours?",
    "What's the best advice anyone ever gave you?",
    "What do you do for a living? Tell a fact about it nobody would guess.",
    "If you had to eat one dish for the rest of your life, what would it be?",
    "What's your most useless talent?",
    "What's popular but drives you mad?",
    "Zombie apocalypse roles: leader, traitor, first victim. Which one are you?",
    "You get 100 million dollars but can't spend any on yourself. Where does it go?",
    "You get one hour of time travel, watching only. Where do you go?",
    "What did you want to be when you were 7?",
    "A month without a smartphone for a million: deal?",
    "Cat or dog? Sell me your choice.",
];

/// Picks uniformly from a built-in list of questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTopics;

impl TopicSource for RandomTopics {
    fn pick(&self) -> String {
        TOPICS
            .choose(&mut rand::rng())
            .map_or_else(String::new, |topic| (*topic).to_string())
    }
}
