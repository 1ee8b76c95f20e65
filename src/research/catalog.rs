use crate::types::AiNiche;

/// Faceless-content niches that need no real-world footage or on-camera host.
static AI_FRIENDLY_NICHES: &[AiNiche] = &[
    AiNiche {
        name: "Data Storytelling",
        description: "Videos that tell stories through data visualization, charts, and graphs.",
        ai_advantage: "AI can easily generate data visualizations and narrative scripts.",
        example_topics: &["Trending Statistics", "Historical Data Analysis", "Visual Data Comparisons"],
    },
    AiNiche {
        name: "Historical Event Animations",
        description: "Animated retellings of historical events, battles, and milestones.",
        ai_advantage: "AI can generate historical images, maps, and animation sequences.",
        example_topics: &["Ancient Civilizations", "Famous Battles", "Historical Mysteries"],
    },
    AiNiche {
        name: "Educational Explainers",
        description: "Videos that explain complex topics using simple animations and graphics.",
        ai_advantage: "AI excels at generating educational scripts and simple explanatory visuals.",
        example_topics: &["Science Concepts", "Math Explainers", "Technology Breakdowns"],
    },
    AiNiche {
        name: "Fact Compilation Videos",
        description: "Collections of interesting facts on specific topics with supporting visuals.",
        ai_advantage: "AI can research facts and generate appropriate imagery for each point.",
        example_topics: &["Amazing Animal Facts", "Space Discoveries", "Historical Coincidences"],
    },
    AiNiche {
        name: "AI Art Showcases",
        description: "Videos featuring AI-generated artwork with narration about the themes or concepts.",
        ai_advantage: "AI directly generates the main visual content with high uniqueness.",
        example_topics: &["Fantasy Landscapes", "Character Designs", "Art Style Transformations"],
    },
    AiNiche {
        name: "Ambient Soundscapes",
        description: "Relaxing videos with AI-generated landscapes and soundscapes for study, sleep, or relaxation.",
        ai_advantage: "AI can create endless variations of scenes and accompanying audio.",
        example_topics: &["Study Ambience", "Sleep Soundscapes", "Meditation Backgrounds"],
    },
    AiNiche {
        name: "Quote Collections",
        description: "Inspirational or thematic quotes with supporting visuals and music.",
        ai_advantage: "AI can generate visuals for each quote and compile them seamlessly.",
        example_topics: &["Motivational Quotes", "Famous Author Quotes", "Life Advice"],
    },
    AiNiche {
        name: "Digital Storytelling",
        description: "Short stories or narratives illustrated with AI-generated scenes.",
        ai_advantage: "AI can create story scripts and matching visual representations.",
        example_topics: &["Short Tales", "Modern Fables", "Sci-Fi Stories"],
    },
    AiNiche {
        name: "News Summaries",
        description: "Summaries of current events with supporting graphics and data visualization.",
        ai_advantage: "AI can compile news from sources and create explanatory graphics.",
        example_topics: &["Daily News Roundup", "Weekly Tech News", "Sports Highlights"],
    },
    AiNiche {
        name: "Top 10 Lists",
        description: "Countdown-style videos on various topics with explanations and visuals for each item.",
        ai_advantage: "AI can research topics and generate appropriate visuals for each list item.",
        example_topics: &["Amazing Discoveries", "Strange Natural Phenomena", "Historical Mysteries"],
    },
];

pub fn ai_friendly_niches() -> &'static [AiNiche] {
    AI_FRIENDLY_NICHES
}
