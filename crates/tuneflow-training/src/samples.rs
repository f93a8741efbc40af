use crate::dataset::DatasetStore;
use crate::error::TrainingResult;

const SAMPLES: [(&str, &str, &str); 3] = [
    (
        "Write a professional email to decline a job offer politely.",
        "Dear [Hiring Manager],\n\nThank you for offering me the position. After careful consideration, I must decline as I have accepted another opportunity. I appreciate your time and consideration.\n\nBest regards,\n[Your Name]",
        "Hi there,\n\nThanks for the job offer! Unfortunately, I can't take it because I found something better. Hope you understand.\n\nThanks again!",
    ),
    (
        "Explain quantum computing in simple terms for a 10-year-old.",
        "Quantum computing is like having a magical computer that can try many different solutions to a problem at the same time, instead of trying them one by one like regular computers. It uses special particles called 'qubits' that can be in multiple states simultaneously, making calculations much faster for certain types of problems.",
        "Quantum computers use quantum mechanics and superposition to process information using qubits instead of bits. They leverage quantum entanglement and interference to perform parallel computations, offering exponential speedup for specific algorithmic problems through quantum gates and circuits.",
    ),
    (
        "Write a Python function to check if a string is a palindrome.",
        "def is_palindrome(s):\n    s = s.lower().replace(' ', '')\n    return s == s[::-1]\n\n# Example usage:\nprint(is_palindrome('A man a plan a canal Panama'))  # True",
        "def check_palindrome(text):\n    clean_text = ''.join(char.lower() for char in text if char.isalnum())\n    left, right = 0, len(clean_text) - 1\n\n    while left < right:\n        if clean_text[left] != clean_text[right]:\n            return False\n        left += 1\n        right -= 1\n\n    return True",
    ),
];

/// Seed `store` with the built-in demo comparisons.
pub fn add_sample_comparisons(store: &mut DatasetStore) -> TrainingResult<usize> {
    for (prompt, a, b) in SAMPLES {
        store.add(prompt, a, b)?;
    }
    Ok(SAMPLES.len())
}
